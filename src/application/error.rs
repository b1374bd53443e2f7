use std::error::Error as StdError;

use thiserror::Error;

use crate::{application::print::PrintError, domain::error::DomainError, infra::error::InfraError};

/// Flattened error chain for reporting at the process boundary.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// Messages joined outermost first.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to render document: {0}")]
    Print(#[from] PrintError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "assignment.json missing");
        let error = AppError::from(InfraError::from(io));
        let report = error.report();

        assert_eq!(report.source, "application::error::AppError");
        assert_eq!(report.messages[0], "io error: assignment.json missing");
        assert!(report.chain().contains("assignment.json missing"));
    }

    #[test]
    fn domain_errors_are_transparent() {
        let error = AppError::from(DomainError::validation("bad slot"));
        assert_eq!(error.to_string(), "domain validation failed: bad slot");
    }
}
