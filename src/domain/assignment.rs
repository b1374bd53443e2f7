//! Assignment definitions as authored by course staff.

use serde::{Deserialize, Serialize};

use super::submission::SlotId;

/// Image embedded in a problem statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentImage {
    /// Base64 payload without a `data:` prefix.
    pub data: String,
    pub content_type: String,
    #[serde(default)]
    pub filename: String,
}

impl AssignmentImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data)
    }
}

/// Kind of answer widget attached to a problem or subsection.
///
/// The editing surface stores these as human-readable labels; the short tag
/// names are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionElementKind {
    #[serde(rename = "Answer as text", alias = "TEXT")]
    Text,
    #[serde(rename = "Answer as image", alias = "IMAGE")]
    Image,
    #[serde(rename = "AI Reflective", alias = "AI-REFLECTIVE")]
    AiReflective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub subsection_statement: String,
    pub points: f64,
    #[serde(default)]
    pub submission_elements: Vec<SubmissionElementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images_allowed: Option<u32>,
    #[serde(default)]
    pub allow_pdf_upload: bool,
}

impl Subsection {
    pub fn image_capacity(&self) -> usize {
        self.max_images_allowed.unwrap_or(0) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_statement: String,
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_image: Option<AssignmentImage>,
    /// Ignored when `subsections` is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_elements: Option<Vec<SubmissionElementKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images_allowed: Option<u32>,
    #[serde(default)]
    pub allow_pdf_upload: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,
}

impl Problem {
    pub fn has_subsections(&self) -> bool {
        !self.subsections.is_empty()
    }

    pub fn submission_elements(&self) -> &[SubmissionElementKind] {
        self.submission_elements.as_deref().unwrap_or_default()
    }

    pub fn image_capacity(&self) -> usize {
        self.max_images_allowed.unwrap_or(0) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_title: String,
    pub course_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    pub total_points: f64,
    pub problems: Vec<Problem>,
}

impl Assignment {
    /// Every answerable slot in document order.
    ///
    /// Problems with subsections contribute one slot per subsection and none of
    /// their own.
    pub fn slots(&self) -> Vec<SlotId> {
        let mut slots = Vec::new();
        for (problem_index, problem) in self.problems.iter().enumerate() {
            if problem.has_subsections() {
                slots.extend(
                    (0..problem.subsections.len())
                        .map(|subsection_index| SlotId::subsection(problem_index, subsection_index)),
                );
            } else {
                slots.push(SlotId::problem(problem_index));
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "assignment_title": "Homework 3",
        "course_code": "MATH 201",
        "total_points": 20,
        "problems": [
            {
                "problem_statement": "Compute $\\int_0^1 x\\,dx$.",
                "points": 5,
                "submission_elements": ["Answer as text", "IMAGE"],
                "max_images_allowed": 2
            },
            {
                "problem_statement": "Answer both parts.",
                "points": 15,
                "subsections": [
                    {
                        "subsection_statement": "Part one",
                        "points": 7.5,
                        "submission_elements": ["AI Reflective"]
                    },
                    {
                        "subsection_statement": "Part two",
                        "points": 7.5,
                        "submission_elements": ["TEXT"],
                        "max_images_allowed": null
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn deserializes_labels_and_tags() {
        let assignment: Assignment = serde_json::from_str(SAMPLE).expect("valid assignment");

        let first = &assignment.problems[0];
        assert_eq!(
            first.submission_elements(),
            &[SubmissionElementKind::Text, SubmissionElementKind::Image]
        );
        assert_eq!(first.image_capacity(), 2);
        assert!(!first.has_subsections());

        let second = &assignment.problems[1];
        assert!(second.has_subsections());
        assert!(second.submission_elements().is_empty());
        assert_eq!(
            second.subsections[0].submission_elements,
            vec![SubmissionElementKind::AiReflective]
        );
        assert_eq!(second.subsections[1].image_capacity(), 0);
    }

    #[test]
    fn unknown_element_label_is_rejected() {
        let json = r#"{"problem_statement": "x", "points": 1, "submission_elements": ["Answer as video"]}"#;
        assert!(serde_json::from_str::<Problem>(json).is_err());
    }

    #[test]
    fn slots_follow_document_order() {
        let assignment: Assignment = serde_json::from_str(SAMPLE).expect("valid assignment");
        let keys: Vec<String> = assignment.slots().iter().map(SlotId::to_string).collect();
        assert_eq!(keys, vec!["p0", "p1_s0", "p1_s1"]);
    }

    #[test]
    fn problem_image_data_uri() {
        let image = AssignmentImage {
            data: "iVBORw0KGgo=".to_string(),
            content_type: "image/png".to_string(),
            filename: "diagram.png".to_string(),
        };
        assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }
}
