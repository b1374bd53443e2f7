//! Student submission state consumed by the print pipeline.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use super::{assignment::Assignment, error::DomainError};

/// Positional address of one answerable unit.
///
/// Derived purely from indices so the same assignment structure always maps
/// to the same keys regardless of what has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    problem: usize,
    subsection: Option<usize>,
}

impl SlotId {
    pub fn problem(problem: usize) -> Self {
        Self {
            problem,
            subsection: None,
        }
    }

    pub fn subsection(problem: usize, subsection: usize) -> Self {
        Self {
            problem,
            subsection: Some(subsection),
        }
    }

    pub fn problem_index(&self) -> usize {
        self.problem
    }

    pub fn subsection_index(&self) -> Option<usize> {
        self.subsection
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subsection {
            Some(subsection) => write!(f, "p{}_s{}", self.problem, subsection),
            None => write!(f, "p{}", self.problem),
        }
    }
}

impl FromStr for SlotId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("`{value}` is not a slot identifier"));

        let rest = value.strip_prefix('p').ok_or_else(invalid)?;
        let (problem, subsection) = match rest.split_once("_s") {
            Some((problem, subsection)) => (problem, Some(subsection)),
            None => (rest, None),
        };

        let problem = parse_index(problem).ok_or_else(invalid)?;
        match subsection {
            Some(subsection) => Ok(Self::subsection(
                problem,
                parse_index(subsection).ok_or_else(invalid)?,
            )),
            None => Ok(Self::problem(problem)),
        }
    }
}

fn parse_index(value: &str) -> Option<usize> {
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

impl Serialize for SlotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Answers recorded for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
    /// Data-URI images addressed by position; `None` marks an empty slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_answers: Option<Vec<Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reflective: Option<String>,
}

impl SubmissionEntry {
    pub fn text(&self) -> Option<&str> {
        non_empty(self.text_answer.as_deref())
    }

    pub fn reflection(&self) -> Option<&str> {
        non_empty(self.ai_reflective.as_deref())
    }

    /// Image stored at `index`, treating empty strings as gaps.
    pub fn image(&self, index: usize) -> Option<&str> {
        let images = self.image_answers.as_ref()?;
        non_empty(images.get(index)?.as_deref())
    }

    /// Length of the positional image list, gaps included.
    pub fn image_slots_len(&self) -> usize {
        self.image_answers.as_ref().map_or(0, Vec::len)
    }

    pub fn submitted_image_count(&self) -> usize {
        (0..self.image_slots_len())
            .filter(|index| self.image(*index).is_some())
            .count()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

/// Submission state keyed by slot identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionData(BTreeMap<String, SubmissionEntry>);

impl SubmissionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotId) -> Option<&SubmissionEntry> {
        self.0.get(&slot.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys that do not address any slot of `assignment`, including keys that
    /// are not slot identifiers at all.
    pub fn orphaned_keys(&self, assignment: &Assignment) -> Vec<&str> {
        let slots = assignment.slots();
        self.0
            .keys()
            .filter(|key| match key.parse::<SlotId>() {
                Ok(slot) => !slots.contains(&slot),
                Err(_) => true,
            })
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<(SlotId, SubmissionEntry)> for SubmissionData {
    fn from_iter<I: IntoIterator<Item = (SlotId, SubmissionEntry)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(slot, entry)| (slot.to_string(), entry))
                .collect(),
        )
    }
}

/// Whose work a printed document belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub name: String,
    pub id: String,
}

impl StudentIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Export file written by the editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupData {
    pub student_name: String,
    pub student_id: String,
    pub submission_data: SubmissionData,
    pub assignment_title: String,
    pub course_code: String,
    pub exported_at: String,
    pub version: String,
}

impl BackupData {
    pub fn student(&self) -> StudentIdentity {
        StudentIdentity::new(self.student_name.clone(), self.student_id.clone())
    }

    /// Whether the backup was exported for `assignment`.
    pub fn belongs_to(&self, assignment: &Assignment) -> bool {
        self.assignment_title == assignment.assignment_title
            && self.course_code == assignment.course_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_ids_format_and_parse() {
        assert_eq!(SlotId::problem(3).to_string(), "p3");
        assert_eq!(SlotId::subsection(1, 2).to_string(), "p1_s2");
        assert_eq!("p1_s2".parse::<SlotId>().expect("parse"), SlotId::subsection(1, 2));
        assert_eq!("p0".parse::<SlotId>().expect("parse"), SlotId::problem(0));

        for invalid in ["", "p", "q1", "p1_s", "p-1", "p1_sx", "p1_s2_s3"] {
            let err = invalid.parse::<SlotId>().expect_err("invalid slot rejected");
            assert!(matches!(err, DomainError::Validation { .. }), "{invalid}");
        }
    }

    #[test]
    fn sparse_images_keep_their_positions() {
        let json = r#"{
            "p0": { "imageAnswers": [null, "", "data:image/png;base64,AAAA"] }
        }"#;
        let data: SubmissionData = serde_json::from_str(json).expect("valid submission data");
        let entry = data.get(SlotId::problem(0)).expect("entry present");

        assert_eq!(entry.image(0), None);
        assert_eq!(entry.image(1), None);
        assert_eq!(entry.image(2), Some("data:image/png;base64,AAAA"));
        assert_eq!(entry.image(3), None);
        assert_eq!(entry.image_slots_len(), 3);
        assert_eq!(entry.submitted_image_count(), 1);
    }

    #[test]
    fn empty_text_counts_as_absent() {
        let entry = SubmissionEntry {
            text_answer: Some(String::new()),
            ai_reflective: Some("Used a CAS to check".to_string()),
            ..SubmissionEntry::default()
        };
        assert_eq!(entry.text(), None);
        assert_eq!(entry.reflection(), Some("Used a CAS to check"));
    }

    #[test]
    fn orphaned_keys_are_reported() {
        let assignment: Assignment = serde_json::from_str(
            r#"{
                "assignment_title": "HW",
                "course_code": "C1",
                "total_points": 1,
                "problems": [{ "problem_statement": "x", "points": 1 }]
            }"#,
        )
        .expect("valid assignment");

        let data: SubmissionData = [
            (SlotId::problem(0), SubmissionEntry::default()),
            (SlotId::problem(4), SubmissionEntry::default()),
        ]
        .into_iter()
        .collect();

        assert_eq!(data.orphaned_keys(&assignment), vec!["p4"]);
    }

    #[test]
    fn backup_round_trips_wire_names() {
        let json = r#"{
            "student_name": "Ada",
            "student_id": "S-1",
            "submission_data": { "p0": { "textAnswer": "42" } },
            "assignment_title": "HW",
            "course_code": "C1",
            "exported_at": "2024-05-01T10:00:00Z",
            "version": "v3.0.0"
        }"#;
        let backup: BackupData = serde_json::from_str(json).expect("valid backup");
        assert_eq!(backup.student(), StudentIdentity::new("Ada", "S-1"));
        assert_eq!(
            backup
                .submission_data
                .get(SlotId::problem(0))
                .and_then(SubmissionEntry::text),
            Some("42")
        );
    }
}
