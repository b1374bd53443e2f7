use katex::{OptsBuilder, OutputType};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Error)]
pub enum MathBackendError {
    #[error("math backend `{backend}` is not available")]
    Unavailable { backend: &'static str },
    #[error("failed to build KaTeX options: {message}")]
    Options { message: String },
    #[error("KaTeX rendering failed: {message}")]
    Render { message: String },
}

/// Typesetting engine that turns a bare TeX expression into trusted markup.
///
/// Implementations must not fail on malformed TeX: errors inside the
/// expression are reported inline in the returned markup. `Err` is reserved
/// for the engine itself misbehaving.
pub trait MathBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the engine can currently accept work.
    fn is_present(&self) -> bool;

    fn render(&self, expression: &str, display_mode: bool) -> Result<String, MathBackendError>;
}

/// KaTeX running inside the embedded JavaScript engine.
#[derive(Debug, Default)]
pub struct KatexBackend {
    present: OnceCell<bool>,
}

impl KatexBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MathBackend for KatexBackend {
    fn name(&self) -> &'static str {
        "katex"
    }

    fn is_present(&self) -> bool {
        *self.present.get_or_init(|| match katex::render("x") {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    target = "application::math::backend",
                    backend = "katex",
                    error = %err,
                    "KaTeX engine failed its startup probe"
                );
                false
            }
        })
    }

    fn render(&self, expression: &str, display_mode: bool) -> Result<String, MathBackendError> {
        let mut builder = OptsBuilder::default();
        builder.display_mode(display_mode);
        builder.output_type(OutputType::Html);
        builder.throw_on_error(false);
        builder.trust(true);
        builder.fleqn(false);

        let opts = builder.build().map_err(|err| MathBackendError::Options {
            message: err.to_string(),
        })?;

        katex::render_with_opts(expression, opts).map_err(|err| MathBackendError::Render {
            message: err.to_string(),
        })
    }
}

/// Backend used when math rendering is switched off; never becomes present.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

impl MathBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_present(&self) -> bool {
        false
    }

    fn render(&self, _expression: &str, _display_mode: bool) -> Result<String, MathBackendError> {
        Err(MathBackendError::Unavailable {
            backend: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn katex_renders_inline_html() {
        let backend = KatexBackend::new();
        assert!(backend.is_present());

        let html = backend.render("a^2", false).expect("render succeeds");
        assert!(html.contains("class=\"katex\""));
        assert!(!html.contains("katex-display"));
    }

    #[test]
    fn katex_display_mode_wraps_in_display_container() {
        let html = KatexBackend::new()
            .render("\\frac{1}{2}", true)
            .expect("render succeeds");
        assert!(html.contains("katex-display"));
    }

    #[test]
    fn katex_reports_malformed_tex_inline() {
        let html = KatexBackend::new()
            .render("\\frac{1}{", false)
            .expect("malformed input does not raise");
        assert!(!html.is_empty());
    }

    #[test]
    fn disabled_backend_is_never_present() {
        let backend = DisabledBackend;
        assert!(!backend.is_present());
        assert!(matches!(
            backend.render("x", false),
            Err(MathBackendError::Unavailable { backend: "disabled" })
        ));
    }
}
