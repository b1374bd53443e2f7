use assert_cmd::Command;
use predicates::str::contains;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn gradebridge(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gradebridge"));
    cmd.current_dir(workdir.path())
        .env_remove("GRADEBRIDGE_CONFIG_FILE")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn print_writes_document_to_file() {
    let workdir = TempDir::new().expect("temp dir");
    let output = workdir.path().join("out.html");

    gradebridge(&workdir)
        .arg("print")
        .arg("--assignment")
        .arg(fixture("assignment.json"))
        .arg("--submission")
        .arg(fixture("backup.json"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let html = std::fs::read_to_string(&output).expect("output written");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Grace Hopper"));
    assert!(html.contains("Generated by GradeBridge Lite"));
    assert!(html.contains("class=\"katex\""));
    assert_eq!(html.matches("class=\"page page-break\"").count(), 9);
}

#[test]
fn print_with_disabled_math_falls_back_to_source() {
    let workdir = TempDir::new().expect("temp dir");

    gradebridge(&workdir)
        .arg("print")
        .arg("--assignment")
        .arg(fixture("assignment.json"))
        .arg("--submission")
        .arg(fixture("submission.json"))
        .arg("--student-name")
        .arg("Ada")
        .arg("--student-id")
        .arg("S-1")
        .arg("--math-backend")
        .arg("disabled")
        .assert()
        .success()
        .stdout(contains("<span class=\"math-fallback\">$x^2$</span>"))
        .stdout(contains("ID: S-1"))
        .stderr(contains("does not define"));
}

#[test]
fn plan_prints_json_page_descriptors() {
    let workdir = TempDir::new().expect("temp dir");

    let assert = gradebridge(&workdir)
        .arg("plan")
        .arg("--assignment")
        .arg(fixture("assignment.json"))
        .arg("--submission")
        .arg(fixture("backup.json"))
        .assert()
        .success();

    let plan: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("plan is JSON");
    let pages = plan["pages"].as_array().expect("pages array");
    assert_eq!(pages.len(), 10);
    assert_eq!(pages[0]["type"], "TitlePage");
    assert_eq!(pages[0]["student_name"], "Grace Hopper");
    assert_eq!(pages[2]["type"], "OverflowImagePage");
    assert_eq!(pages[2]["image"]["data"], serde_json::Value::Null);
    assert_eq!(pages[3]["is_last_overflow"], true);
}

#[test]
fn segments_lists_each_run() {
    let workdir = TempDir::new().expect("temp dir");

    gradebridge(&workdir)
        .arg("segments")
        .arg("$$a$$ and $b$")
        .assert()
        .success()
        .stdout("block  \"$$a$$\"\nplain  \" and \"\ninline \"$b$\"\n");
}

#[test]
fn segments_reads_stdin() {
    let workdir = TempDir::new().expect("temp dir");

    gradebridge(&workdir)
        .arg("segments")
        .write_stdin("cost is $5 today\n")
        .assert()
        .success()
        .stdout("plain  \"cost is $5 today\"\n");
}

#[test]
fn invalid_configuration_fails_fast() {
    let workdir = TempDir::new().expect("temp dir");

    gradebridge(&workdir)
        .arg("print")
        .arg("--assignment")
        .arg(fixture("assignment.json"))
        .arg("--submission")
        .arg(fixture("backup.json"))
        .arg("--math-backend")
        .arg("mathjax")
        .assert()
        .failure()
        .stderr(contains("math.backend"));
}

#[test]
fn missing_assignment_names_the_file() {
    let workdir = TempDir::new().expect("temp dir");

    gradebridge(&workdir)
        .arg("plan")
        .arg("--assignment")
        .arg(workdir.path().join("nope.json"))
        .arg("--submission")
        .arg(fixture("backup.json"))
        .assert()
        .failure()
        .stderr(contains("failed to read"))
        .stderr(contains("nope.json"));
}
