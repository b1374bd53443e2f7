use serde::Serialize;

use crate::domain::{assignment::AssignmentImage, submission::SlotId};

/// Header band printed on every page except the title page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub student_id: String,
    pub student_name: String,
    /// Course code.
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePagePlan {
    pub course_code: String,
    pub course_name: Option<String>,
    pub assignment_title: String,
    pub preamble: Option<String>,
    pub student_name: String,
    pub student_id: String,
    pub total_points: f64,
}

/// Human-facing name of an answer unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitLabel {
    Problem { number: usize },
    Subsection { problem_number: usize, letter: String },
}

impl UnitLabel {
    pub fn for_slot(slot: SlotId) -> Self {
        let number = slot.problem_index() + 1;
        match slot.subsection_index() {
            Some(subsection) => UnitLabel::Subsection {
                problem_number: number,
                letter: part_letter(subsection),
            },
            None => UnitLabel::Problem { number },
        }
    }

    pub fn problem_number(&self) -> usize {
        match self {
            UnitLabel::Problem { number } => *number,
            UnitLabel::Subsection { problem_number, .. } => *problem_number,
        }
    }

    /// Subtitle of the unit's main page.
    pub fn main_subtitle(&self) -> String {
        match self {
            UnitLabel::Problem { number } => format!("Problem {number}"),
            UnitLabel::Subsection {
                problem_number,
                letter,
            } => format!("Problem {problem_number} - Part ({letter})"),
        }
    }

    /// Subtitle of the overflow page holding 1-based image `number`.
    pub fn overflow_subtitle(&self, number: usize) -> String {
        match self {
            UnitLabel::Problem { number: problem } => format!("Problem {problem} (Image {number})"),
            UnitLabel::Subsection {
                problem_number,
                letter,
            } => format!("Problem {problem_number}({letter}) - Image {number}"),
        }
    }
}

/// Lowercase label for a subsection position: `a`..`z`, then `aa`, `ab`, ...
pub fn part_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        remaining -= 1;
        letters.push(char::from(b'a' + (remaining % 26) as u8));
        remaining /= 26;
    }
    letters.iter().rev().collect()
}

/// One image position of an answer unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSlot {
    /// 0-based position in the submitted image list.
    pub index: usize,
    pub total: usize,
    /// Data URI, `None` when nothing was submitted here.
    pub data: Option<String>,
}

impl ImageSlot {
    /// 1-based number as printed.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerBlock {
    Text { content: String },
    Image { image: ImageSlot },
    Reflection { content: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerPlan {
    /// No entry exists for the slot.
    Missing,
    Blocks { blocks: Vec<AnswerBlock> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSection {
    pub slot: SlotId,
    pub label: UnitLabel,
    pub points: f64,
    pub statement: String,
    pub image: Option<AssignmentImage>,
    pub answer: AnswerPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBody {
    /// Narrative of a problem whose answers live in its subsections.
    Statement {
        problem_number: usize,
        points: f64,
        statement: String,
        image: Option<AssignmentImage>,
    },
    Answer(AnswerSection),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPage {
    pub header: PageHeader,
    pub body: PageBody,
    pub has_leading_answer_marker: bool,
    pub has_trailing_answer_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowImagePage {
    pub header: PageHeader,
    pub slot: SlotId,
    pub image: ImageSlot,
    pub is_last_overflow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PageDescriptor {
    TitlePage(TitlePagePlan),
    ContentPage(ContentPage),
    OverflowImagePage(OverflowImagePage),
}

impl PageDescriptor {
    pub fn header(&self) -> Option<&PageHeader> {
        match self {
            PageDescriptor::TitlePage(_) => None,
            PageDescriptor::ContentPage(page) => Some(&page.header),
            PageDescriptor::OverflowImagePage(page) => Some(&page.header),
        }
    }

    /// Whether a page break precedes this page.
    pub fn breaks_before(&self) -> bool {
        !matches!(self, PageDescriptor::TitlePage(_))
    }

    pub fn has_leading_answer_marker(&self) -> bool {
        matches!(self, PageDescriptor::ContentPage(page) if page.has_leading_answer_marker)
    }

    pub fn has_trailing_answer_marker(&self) -> bool {
        match self {
            PageDescriptor::TitlePage(_) => false,
            PageDescriptor::ContentPage(page) => page.has_trailing_answer_marker,
            PageDescriptor::OverflowImagePage(page) => page.is_last_overflow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPlan {
    pub pages: Vec<PageDescriptor>,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn subtitles(&self) -> Vec<&str> {
        self.pages
            .iter()
            .filter_map(PageDescriptor::header)
            .map(|header| header.subtitle.as_str())
            .collect()
    }
}
