use std::sync::Arc;

use gradebridge::{
    application::{
        document::{PageDescriptor, plan_document},
        math::{
            BackendState, DisabledBackend, KatexBackend, MathAvailability, MathSpanRenderer,
            configure_math_availability, math_availability,
        },
        print::{DEFAULT_PRODUCT_LABEL, PageRenderer},
        richtext::RichTextRenderer,
    },
    cache::MathRenderCache,
    domain::{
        assignment::Assignment,
        submission::{BackupData, StudentIdentity, SubmissionData},
    },
};
use serial_test::serial;

fn assignment() -> Assignment {
    serde_json::from_str(include_str!("fixtures/assignment.json")).expect("assignment fixture")
}

fn backup() -> BackupData {
    serde_json::from_str(include_str!("fixtures/backup.json")).expect("backup fixture")
}

fn renderer(ready: bool) -> PageRenderer {
    let math = if ready {
        MathSpanRenderer::new(
            Arc::new(KatexBackend::new()),
            MathAvailability::ready(),
            Arc::new(MathRenderCache::default()),
        )
    } else {
        MathSpanRenderer::new(
            Arc::new(DisabledBackend),
            MathAvailability::unavailable(),
            Arc::new(MathRenderCache::default()),
        )
    };
    PageRenderer::new(RichTextRenderer::new(math), DEFAULT_PRODUCT_LABEL)
}

#[test]
fn page_sequence_is_fixed_by_the_assignment() {
    let assignment = assignment();
    let backup = backup();

    let full = plan_document(&assignment, &backup.submission_data, &backup.student());
    let empty = plan_document(&assignment, &SubmissionData::new(), &backup.student());

    assert_eq!(full.page_count(), 10);
    assert_eq!(full.subtitles(), empty.subtitles());
    insta::assert_snapshot!(full.subtitles().join("\n"), @r"
    Problem 1
    Problem 1 (Image 2)
    Problem 1 (Image 3)
    Problem 2
    Problem 2 - Part (a)
    Problem 2 - Part (b)
    Problem 2(b) - Image 2
    Problem 3
    Problem 3 (Image 2)
    ");
}

#[test]
fn every_answer_unit_opens_and_closes_once() {
    let backup = backup();
    let plan = plan_document(&assignment(), &backup.submission_data, &backup.student());

    let starts = plan
        .pages
        .iter()
        .filter(|page| page.has_leading_answer_marker())
        .count();
    let ends = plan
        .pages
        .iter()
        .filter(|page| page.has_trailing_answer_marker())
        .count();
    // p0, p1_s0, p1_s1, p2
    assert_eq!(starts, 4);
    assert_eq!(ends, 4);

    let markers: Vec<(bool, bool)> = plan
        .pages
        .iter()
        .map(|page| {
            (
                page.has_leading_answer_marker(),
                page.has_trailing_answer_marker(),
            )
        })
        .collect();
    assert_eq!(
        markers,
        vec![
            (false, false), // title
            (true, false),
            (false, false),
            (false, true),
            (false, false), // problem 2 statement
            (true, true),
            (true, false),
            (false, true),
            (true, false),
            (false, true),
        ]
    );
}

#[test]
fn headers_carry_student_identity() {
    let backup = backup();
    let plan = plan_document(&assignment(), &backup.submission_data, &backup.student());

    for page in &plan.pages[1..] {
        let header = page.header().expect("content pages have headers");
        assert_eq!(header.student_name, "Grace Hopper");
        assert_eq!(header.student_id, "S-042");
        assert_eq!(header.title, "MATH 201");
    }
    assert!(matches!(plan.pages[0], PageDescriptor::TitlePage(_)));
}

#[test]
fn planning_twice_is_identical() {
    let backup = backup();
    let assignment = assignment();
    let first = plan_document(&assignment, &backup.submission_data, &backup.student());
    let second = plan_document(&assignment, &backup.submission_data, &backup.student());
    assert_eq!(first, second);
}

#[test]
fn unavailable_backend_prints_formulas_verbatim() {
    let backup = backup();
    let plan = plan_document(&assignment(), &backup.submission_data, &backup.student());
    let html = renderer(false).render_document(&plan).expect("document renders");

    assert!(html.contains("<span class=\"math-fallback\">$\\pi&#32;r^2$</span>"));
    assert!(html.contains("<span class=\"math-fallback\">$$\\int_0^1&#32;x\\,dx$$</span>"));
    assert!(!html.contains("class=\"katex\""));
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn ready_backend_typesets_formulas() {
    let backup = backup();
    let plan = plan_document(&assignment(), &backup.submission_data, &backup.student());
    let html = renderer(true).render_document(&plan).expect("document renders");

    assert!(html.contains("class=\"katex\""));
    assert!(html.contains("katex-display"));
    assert!(!html.contains("math-fallback\">"));
}

#[test]
fn rendering_is_idempotent() {
    let backup = backup();
    let plan = plan_document(&assignment(), &backup.submission_data, &backup.student());
    let renderer = renderer(false);
    assert_eq!(
        renderer.render_document(&plan).expect("first render"),
        renderer.render_document(&plan).expect("second render")
    );
}

#[test]
fn pages_render_out_of_order() {
    let plan = plan_document(
        &assignment(),
        &SubmissionData::new(),
        &StudentIdentity::new("Ada", "S-1"),
    );
    let renderer = renderer(false);

    let last = renderer
        .render_page(&plan.pages[9])
        .expect("last page renders");
    assert!(last.contains("Problem 3 (Image 2)"));
    assert!(last.contains("End of Answer"));
    assert!(last.contains("ID: S-1"));
}

#[test]
#[serial]
fn process_wide_monitor_is_configured_once() {
    configure_math_availability(MathAvailability::unavailable()).expect("first configuration");
    assert!(configure_math_availability(MathAvailability::ready()).is_err());
    assert_eq!(math_availability().state(), BackendState::Unavailable);
}
