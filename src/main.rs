use std::{process, sync::Arc};

use gradebridge::{
    application::{
        document::plan_document,
        error::AppError,
        math::{
            AvailabilityConfig, DisabledBackend, KatexBackend, MathAvailability, MathBackend,
            MathSpanRenderer, configure_math_availability,
        },
        print::PageRenderer,
        richtext::RichTextRenderer,
        segment::Scanner,
    },
    cache::MathRenderCache,
    config::{self, DocumentInput, MathBackendKind, MathSettings},
    domain::{
        assignment::Assignment,
        submission::{StudentIdentity, SubmissionData},
    },
    infra::{error::InfraError, input, telemetry},
};
use tokio::io::AsyncWriteExt;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.chain(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.chain(), source = report.source, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Print(args) => run_print(settings, args).await,
        config::Command::Plan(args) => run_plan(args).await,
        config::Command::Segments(args) => run_segments(args).await,
    }
}

async fn run_print(settings: config::Settings, args: config::PrintArgs) -> Result<(), AppError> {
    let (assignment, submissions, student) = load_document_input(&args.input).await?;

    let renderer = build_page_renderer(&settings.math, settings.print.product_label.clone()).await?;
    let plan = plan_document(&assignment, &submissions, &student);
    let html = renderer.render_document(&plan)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, html.as_bytes())
                .await
                .map_err(|err| AppError::from(InfraError::from(err)))?;
            info!(
                target = "gradebridge::print",
                path = %path.display(),
                pages = plan.page_count(),
                "Wrote print document"
            );
        }
        None => write_stdout(&html).await?,
    }

    Ok(())
}

async fn run_plan(args: config::PlanArgs) -> Result<(), AppError> {
    let (assignment, submissions, student) = load_document_input(&args.input).await?;
    let plan = plan_document(&assignment, &submissions, &student);

    let mut json = serde_json::to_string_pretty(&plan)
        .map_err(|err| AppError::unexpected(format!("failed to encode plan: {err}")))?;
    json.push('\n');
    write_stdout(&json).await
}

async fn run_segments(args: config::SegmentsArgs) -> Result<(), AppError> {
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut text = input::read_stdin().await?;
            if text.ends_with('\n') {
                text.pop();
            }
            text
        }
    };

    let mut listing = String::new();
    for segment in Scanner::new(&text) {
        listing.push_str(&segment.to_string());
        listing.push('\n');
    }
    write_stdout(&listing).await
}

async fn load_document_input(
    args: &DocumentInput,
) -> Result<(Assignment, SubmissionData, StudentIdentity), AppError> {
    let assignment = input::read_assignment(&args.assignment).await?;
    let source = input::read_submission(&args.submission, &assignment).await?;

    let recorded = source.student().unwrap_or_default();
    let student = StudentIdentity::new(
        args.student_name.clone().unwrap_or(recorded.name),
        args.student_id.clone().unwrap_or(recorded.id),
    );

    Ok((assignment, source.into_submissions(), student))
}

/// Start the math backend, wait for it to settle and assemble the renderer.
async fn build_page_renderer(
    math: &MathSettings,
    product_label: String,
) -> Result<PageRenderer, AppError> {
    let (backend, availability): (Arc<dyn MathBackend>, MathAvailability) = match math.backend {
        MathBackendKind::Katex => {
            let backend: Arc<dyn MathBackend> = Arc::new(KatexBackend::new());
            let availability = MathAvailability::start(
                Arc::clone(&backend),
                AvailabilityConfig {
                    poll_interval: math.poll_interval,
                    timeout: math.timeout,
                },
            );
            (backend, availability)
        }
        MathBackendKind::Disabled => {
            let backend: Arc<dyn MathBackend> = Arc::new(DisabledBackend);
            (backend, MathAvailability::unavailable())
        }
    };

    configure_math_availability(availability.clone())
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    let state = availability.settled().await;
    info!(
        target = "gradebridge::print",
        backend = backend.name(),
        state = ?state,
        "Math backend settled"
    );

    let cache = Arc::new(MathRenderCache::new(math.cache_capacity.get()));
    let math = MathSpanRenderer::new(backend, availability, cache);
    Ok(PageRenderer::new(RichTextRenderer::new(math), product_label))
}

async fn write_stdout(contents: &str) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(contents.as_bytes())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    stdout
        .flush()
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}
