//! Reading assignment and submission files from disk.

use std::path::Path;

use serde::{Deserialize, de::DeserializeOwned};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::domain::{
    assignment::Assignment,
    submission::{BackupData, StudentIdentity, SubmissionData},
};

use super::error::InfraError;

/// Submission file contents in either supported shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmissionSource {
    Backup(BackupData),
    Data(SubmissionData),
}

impl SubmissionSource {
    pub fn submissions(&self) -> &SubmissionData {
        match self {
            SubmissionSource::Backup(backup) => &backup.submission_data,
            SubmissionSource::Data(data) => data,
        }
    }

    /// Identity recorded in a backup, if any.
    pub fn student(&self) -> Option<StudentIdentity> {
        match self {
            SubmissionSource::Backup(backup) => Some(backup.student()),
            SubmissionSource::Data(_) => None,
        }
    }

    pub fn into_submissions(self) -> SubmissionData {
        match self {
            SubmissionSource::Backup(backup) => backup.submission_data,
            SubmissionSource::Data(data) => data,
        }
    }
}

pub async fn read_assignment(path: &Path) -> Result<Assignment, InfraError> {
    let assignment: Assignment = read_json(path).await?;
    debug!(
        target = "infra::input",
        path = %path.display(),
        problems = assignment.problems.len(),
        "Loaded assignment"
    );
    Ok(assignment)
}

/// Read a submission file and report anything that does not line up with
/// `assignment`.
pub async fn read_submission(
    path: &Path,
    assignment: &Assignment,
) -> Result<SubmissionSource, InfraError> {
    let source: SubmissionSource = read_json(path).await?;

    if let SubmissionSource::Backup(backup) = &source {
        if !backup.belongs_to(assignment) {
            warn!(
                target = "infra::input",
                path = %path.display(),
                backup_title = %backup.assignment_title,
                backup_course = %backup.course_code,
                assignment_title = %assignment.assignment_title,
                assignment_course = %assignment.course_code,
                "Backup was exported for a different assignment"
            );
        }
    }

    let orphaned = source.submissions().orphaned_keys(assignment);
    if !orphaned.is_empty() {
        warn!(
            target = "infra::input",
            path = %path.display(),
            keys = ?orphaned,
            "Submission has entries for slots the assignment does not define"
        );
    }

    let submissions = source.submissions();
    if submissions.is_empty() {
        warn!(
            target = "infra::input",
            path = %path.display(),
            "Submission has no answers; every slot prints as missing"
        );
    } else {
        debug!(
            target = "infra::input",
            path = %path.display(),
            entries = submissions.len(),
            "Loaded submission"
        );
    }

    Ok(source)
}

/// Read all of stdin as text.
pub async fn read_stdin() -> Result<String, InfraError> {
    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;
    Ok(buffer)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InfraError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| InfraError::read(path, err))?;
    serde_json::from_slice(&bytes).map_err(|err| InfraError::decode(path, err.to_string()))
}
