//! Turns a [`DocumentPlan`] into one printable HTML document.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::assignment::AssignmentImage,
    presentation::print::{
        A4_PAGE, AnswerBlockView, AnswerView, ContentBodyView, ContentPageTemplate,
        DocumentTemplate, FIRST_ANSWER_IMAGE_MAX_MM, HeaderView, ImageSlotView, ImageView,
        NO_ANSWER_TEXT, NO_IMAGE_TEXT, OVERFLOW_IMAGE_MAX_MM, OverflowPageTemplate,
        PROBLEM_IMAGE_MAX_MM, PageGeometry, STATEMENT_IMAGE_MAX_MM, TemplateRenderError,
        TitlePageTemplate, UNREADABLE_IMAGE_TEXT, render_template,
    },
};

use super::{
    document::{
        AnswerBlock, AnswerPlan, AnswerSection, ContentPage, DocumentPlan, ImageSlot,
        OverflowImagePage, PageBody, PageDescriptor, PageHeader, TitlePagePlan, UnitLabel,
    },
    richtext::RichTextRenderer,
};

pub const DEFAULT_PRODUCT_LABEL: &str = "Generated by GradeBridge Lite";
pub const METRIC_PAGES_RENDERED_TOTAL: &str = "gradebridge_pages_rendered_total";

const SVG_MEDIA_TYPE: &str = "image/svg+xml";

#[derive(Debug, Error)]
pub enum PrintError {
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

/// Renders page descriptors through the print templates.
#[derive(Clone)]
pub struct PageRenderer {
    rich_text: RichTextRenderer,
    product_label: String,
    geometry: PageGeometry,
}

impl PageRenderer {
    pub fn new(rich_text: RichTextRenderer, product_label: impl Into<String>) -> Self {
        Self {
            rich_text,
            product_label: product_label.into(),
            geometry: A4_PAGE,
        }
    }

    /// Render the whole plan as one HTML document.
    pub fn render_document(&self, plan: &DocumentPlan) -> Result<String, PrintError> {
        let pages = plan
            .pages
            .iter()
            .map(|page| self.render_page(page))
            .collect::<Result<Vec<_>, _>>()?;

        counter!(METRIC_PAGES_RENDERED_TOTAL).increment(pages.len() as u64);
        let title = match plan.pages.first() {
            Some(PageDescriptor::TitlePage(title)) => {
                format!("{} - {}", title.course_code, title.assignment_title)
            }
            _ => String::from("Assignment"),
        };
        info!(
            target = "application::print",
            pages = pages.len(),
            title = %title,
            "Rendered print document"
        );

        let html = render_template(
            &DocumentTemplate {
                title,
                geometry: self.geometry,
                pages,
            },
            "application::print::render_document",
        )?;
        Ok(html)
    }

    /// Render one page on its own; pages carry their own header data.
    pub fn render_page(&self, page: &PageDescriptor) -> Result<String, PrintError> {
        let breaks_before = page.breaks_before();
        let html = match page {
            PageDescriptor::TitlePage(title) => render_template(
                &self.title_page(title, breaks_before),
                "application::print::render_page::title",
            )?,
            PageDescriptor::ContentPage(content) => render_template(
                &self.content_page(content, breaks_before),
                "application::print::render_page::content",
            )?,
            PageDescriptor::OverflowImagePage(overflow) => render_template(
                &overflow_page(overflow, breaks_before),
                "application::print::render_page::overflow",
            )?,
        };
        Ok(html)
    }

    fn title_page(&self, title: &TitlePagePlan, breaks_before: bool) -> TitlePageTemplate {
        TitlePageTemplate {
            breaks_before,
            course_code: title.course_code.clone(),
            course_name: title.course_name.clone(),
            assignment_title: title.assignment_title.clone(),
            preamble_html: self.rich_text.render(title.preamble.as_deref()),
            student_name: title.student_name.clone(),
            student_id: title.student_id.clone(),
            total_points: title.total_points.to_string(),
            product_label: self.product_label.clone(),
        }
    }

    fn content_page(&self, page: &ContentPage, breaks_before: bool) -> ContentPageTemplate {
        let body = match &page.body {
            PageBody::Statement {
                problem_number,
                points,
                statement,
                image,
            } => ContentBodyView {
                statement_page: true,
                heading: format!("Problem {problem_number}"),
                badge: None,
                points_label: format!("{points} Points"),
                statement_html: self.rich_text.render(Some(statement)),
                problem_image: image
                    .as_ref()
                    .map(|image| problem_image(image, STATEMENT_IMAGE_MAX_MM)),
                answer: None,
            },
            PageBody::Answer(section) => self.answer_body(section),
        };

        ContentPageTemplate {
            breaks_before,
            header: header_view(&page.header),
            body,
            leading_marker: page.has_leading_answer_marker,
            trailing_marker: page.has_trailing_answer_marker,
        }
    }

    fn answer_body(&self, section: &AnswerSection) -> ContentBodyView {
        let (heading, badge, points_label) = match &section.label {
            UnitLabel::Problem { number } => {
                (format!("Problem {number}"), None, format!("{} Points", section.points))
            }
            UnitLabel::Subsection { letter, .. } => (
                format!("Part {letter}"),
                Some(letter.clone()),
                format!("({} points)", section.points),
            ),
        };

        let answer = match &section.answer {
            AnswerPlan::Missing => AnswerView {
                missing_text: Some(NO_ANSWER_TEXT),
                blocks: Vec::new(),
            },
            AnswerPlan::Blocks { blocks } => AnswerView {
                missing_text: None,
                blocks: blocks.iter().map(|block| self.answer_block(block)).collect(),
            },
        };

        ContentBodyView {
            statement_page: false,
            heading,
            badge,
            points_label,
            statement_html: self.rich_text.render(Some(&section.statement)),
            problem_image: section
                .image
                .as_ref()
                .map(|image| problem_image(image, PROBLEM_IMAGE_MAX_MM)),
            answer: Some(answer),
        }
    }

    fn answer_block(&self, block: &AnswerBlock) -> AnswerBlockView {
        match block {
            AnswerBlock::Text { content } => AnswerBlockView {
                text_html: Some(self.rich_text.render(Some(content))),
                ..AnswerBlockView::default()
            },
            AnswerBlock::Image { image } => AnswerBlockView {
                image: Some(image_slot_view(image, FIRST_ANSWER_IMAGE_MAX_MM)),
                ..AnswerBlockView::default()
            },
            AnswerBlock::Reflection { content } => AnswerBlockView {
                reflection_html: Some(self.rich_text.render(Some(content))),
                ..AnswerBlockView::default()
            },
        }
    }
}

fn overflow_page(page: &OverflowImagePage, breaks_before: bool) -> OverflowPageTemplate {
    OverflowPageTemplate {
        breaks_before,
        header: header_view(&page.header),
        slot: image_slot_view(&page.image, OVERFLOW_IMAGE_MAX_MM),
        trailing_marker: page.is_last_overflow,
    }
}

fn header_view(header: &PageHeader) -> HeaderView {
    HeaderView {
        student_id: header.student_id.clone(),
        student_name: header.student_name.clone(),
        title: header.title.clone(),
        subtitle: header.subtitle.clone(),
    }
}

fn problem_image(image: &AssignmentImage, max_height_mm: u32) -> ImageView {
    ImageView {
        src: image.data_uri(),
        alt: String::from("Problem Diagram"),
        max_height_mm,
    }
}

fn image_slot_view(slot: &ImageSlot, max_height_mm: u32) -> ImageSlotView {
    let (image, placeholder) = match slot.data.as_deref() {
        None => (None, Some(NO_IMAGE_TEXT)),
        Some(data) => match inspect_image(data) {
            Ok(()) => (
                Some(ImageView {
                    src: data.to_string(),
                    alt: format!("Student work {}", slot.number()),
                    max_height_mm,
                }),
                None,
            ),
            Err(reason) => {
                warn!(
                    target = "application::print",
                    image = slot.number(),
                    reason,
                    "Submitted image could not be read"
                );
                (None, Some(UNREADABLE_IMAGE_TEXT))
            }
        },
    };

    ImageSlotView {
        number: slot.number(),
        total: slot.total,
        image,
        placeholder,
    }
}

/// Check that `data` is a base64 data URI holding a recognisable image.
///
/// Raster formats are probed with `imagesize`. SVG has no fixed pixel size,
/// so it only has to decode to a document with an `<svg` root.
pub fn inspect_image(data: &str) -> Result<(), &'static str> {
    let rest = data.strip_prefix("data:").ok_or("not a data URI")?;
    let (media, payload) = rest.split_once(',').ok_or("data URI has no payload")?;
    let media_type = media
        .strip_suffix(";base64")
        .ok_or("data URI is not base64 encoded")?;
    if !media_type.starts_with("image/") {
        return Err("data URI is not an image");
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| "payload is not valid base64")?;
    if media_type == SVG_MEDIA_TYPE {
        return match std::str::from_utf8(&bytes) {
            Ok(text) if text.contains("<svg") => Ok(()),
            _ => Err("payload is not an SVG document"),
        };
    }
    imagesize::blob_size(&bytes).map_err(|_| "payload is not a recognised image format")?;
    Ok(())
}
