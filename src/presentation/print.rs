//! Askama views for the printable document.

use askama::{Error as AskamaError, Template};
use thiserror::Error;
use tracing::error;

/// Fixed page box, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width_mm: u32,
    pub min_height_mm: u32,
    pub title_min_height_mm: u32,
    pub padding_block_mm: u32,
    pub padding_inline_mm: u32,
}

pub const A4_PAGE: PageGeometry = PageGeometry {
    width_mm: 210,
    min_height_mm: 260,
    title_min_height_mm: 280,
    padding_block_mm: 15,
    padding_inline_mm: 20,
};

/// Maximum rendered image heights, in millimetres.
pub const PROBLEM_IMAGE_MAX_MM: u32 = 120;
pub const STATEMENT_IMAGE_MAX_MM: u32 = 160;
pub const FIRST_ANSWER_IMAGE_MAX_MM: u32 = 140;
pub const OVERFLOW_IMAGE_MAX_MM: u32 = 240;

pub const NO_ANSWER_TEXT: &str = "No answer submitted.";
pub const NO_IMAGE_TEXT: &str = "No image submitted for this slot";
pub const UNREADABLE_IMAGE_TEXT: &str = "Image could not be read";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

pub fn render_template<T: Template>(
    template: &T,
    source: &'static str,
) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        let err = TemplateRenderError::new(source, "Template rendering failed", err);
        error!(
            target = "presentation::print",
            source = err.source,
            error = %err.error,
            "Failed to render print template"
        );
        err
    })
}

#[derive(Debug, Clone)]
pub struct HeaderView {
    pub student_id: String,
    pub student_name: String,
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone)]
pub struct ImageView {
    pub src: String,
    pub alt: String,
    pub max_height_mm: u32,
}

/// One numbered image slot of a student's answer.
#[derive(Debug, Clone)]
pub struct ImageSlotView {
    pub number: usize,
    pub total: usize,
    pub image: Option<ImageView>,
    /// Shown instead of the image when there is none to draw.
    pub placeholder: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct AnswerBlockView {
    pub text_html: Option<String>,
    pub reflection_html: Option<String>,
    pub image: Option<ImageSlotView>,
}

#[derive(Debug, Clone)]
pub struct AnswerView {
    /// Set when no entry exists for the slot.
    pub missing_text: Option<&'static str>,
    pub blocks: Vec<AnswerBlockView>,
}

#[derive(Debug, Clone)]
pub struct ContentBodyView {
    pub statement_page: bool,
    pub heading: String,
    /// Part letter badge for subsection pages.
    pub badge: Option<String>,
    pub points_label: String,
    pub statement_html: String,
    pub problem_image: Option<ImageView>,
    pub answer: Option<AnswerView>,
}

#[derive(Template)]
#[template(path = "print/title_page.html")]
pub struct TitlePageTemplate {
    pub breaks_before: bool,
    pub course_code: String,
    pub course_name: Option<String>,
    pub assignment_title: String,
    pub preamble_html: String,
    pub student_name: String,
    pub student_id: String,
    pub total_points: String,
    pub product_label: String,
}

#[derive(Template)]
#[template(path = "print/content_page.html")]
pub struct ContentPageTemplate {
    pub breaks_before: bool,
    pub header: HeaderView,
    pub body: ContentBodyView,
    pub leading_marker: bool,
    pub trailing_marker: bool,
}

#[derive(Template)]
#[template(path = "print/overflow_page.html")]
pub struct OverflowPageTemplate {
    pub breaks_before: bool,
    pub header: HeaderView,
    pub slot: ImageSlotView,
    pub trailing_marker: bool,
}

#[derive(Template)]
#[template(path = "print/document.html")]
pub struct DocumentTemplate {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> HeaderView {
        HeaderView {
            student_id: "S-001".to_string(),
            student_name: "Ada <Lovelace>".to_string(),
            title: "MATH 201".to_string(),
            subtitle: "Problem 1 (Image 2)".to_string(),
        }
    }

    #[test]
    fn overflow_page_shows_placeholder_and_end_marker() {
        let html = render_template(
            &OverflowPageTemplate {
                breaks_before: true,
                header: header(),
                slot: ImageSlotView {
                    number: 2,
                    total: 3,
                    image: None,
                    placeholder: Some(NO_IMAGE_TEXT),
                },
                trailing_marker: true,
            },
            "tests",
        )
        .expect("template renders");

        assert!(html.starts_with("<section class=\"page page-break\">"));
        assert!(html.contains("Image 2 of 3"));
        assert!(html.contains(NO_IMAGE_TEXT));
        assert!(html.contains("End of Answer"));
        assert!(!html.contains("Start of Answer"));
        assert!(html.contains("Ada &#60;Lovelace&#62;") || html.contains("Ada &lt;Lovelace&gt;"));
    }

    #[test]
    fn content_page_places_markers_as_flagged() {
        let body = ContentBodyView {
            statement_page: false,
            heading: "Problem 1".to_string(),
            badge: None,
            points_label: "10 Points".to_string(),
            statement_html: "<span class=\"rich-text\">Prove&#32;it</span>".to_string(),
            problem_image: None,
            answer: Some(AnswerView {
                missing_text: Some(NO_ANSWER_TEXT),
                blocks: Vec::new(),
            }),
        };
        let html = render_template(
            &ContentPageTemplate {
                breaks_before: false,
                header: header(),
                body,
                leading_marker: true,
                trailing_marker: false,
            },
            "tests",
        )
        .expect("template renders");

        assert!(html.starts_with("<section class=\"page\">"));
        assert!(html.contains("Start of Answer"));
        assert!(!html.contains("End of Answer"));
        assert!(html.contains(NO_ANSWER_TEXT));
        assert!(html.contains("<span class=\"rich-text\">Prove&#32;it</span>"));
    }

    #[test]
    fn document_stacks_pages_with_geometry() {
        let html = render_template(
            &DocumentTemplate {
                title: "HW".to_string(),
                geometry: A4_PAGE,
                pages: vec!["<section>one</section>".to_string()],
            },
            "tests",
        )
        .expect("template renders");

        assert!(html.contains("width: 210mm"));
        assert!(html.contains("min-height: 260mm"));
        assert!(html.contains("<section>one</section>"));
    }
}
