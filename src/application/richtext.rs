use super::{
    math::MathSpanRenderer,
    segment::{Scanner, Segment},
};

/// Renders content strings that mix prose with `$…$` / `$$…$$` formulas.
#[derive(Clone)]
pub struct RichTextRenderer {
    math: MathSpanRenderer,
}

impl RichTextRenderer {
    pub fn new(math: MathSpanRenderer) -> Self {
        Self { math }
    }

    /// HTML for `content`; absent or empty content renders as nothing.
    ///
    /// Plain runs are escaped verbatim and rely on `white-space: pre-wrap`
    /// in the page stylesheet to keep their line breaks.
    pub fn render(&self, content: Option<&str>) -> String {
        let Some(content) = content.filter(|text| !text.is_empty()) else {
            return String::new();
        };

        let mut html = String::from("<span class=\"rich-text\">");
        for segment in Scanner::new(content) {
            html.push_str(&self.render_segment(segment));
        }
        html.push_str("</span>");
        html
    }

    pub fn render_segment(&self, segment: Segment<'_>) -> String {
        match segment {
            Segment::Plain { text } => ammonia::clean_text(text),
            Segment::Math { source, display } => self.math.render(source, display).to_html(),
        }
    }
}
