use tracing::debug;

use crate::domain::{
    assignment::{Assignment, AssignmentImage, Problem, SubmissionElementKind},
    submission::{SlotId, StudentIdentity, SubmissionData, SubmissionEntry},
};

use super::types::{
    AnswerBlock, AnswerPlan, AnswerSection, ContentPage, DocumentPlan, ImageSlot,
    OverflowImagePage, PageBody, PageDescriptor, PageHeader, TitlePagePlan, UnitLabel,
};

/// Flatten an assignment and its submission into printable pages.
///
/// Pure: equal inputs always produce equal plans. Each answer unit yields one
/// main page plus one overflow page per image slot beyond the first, whether
/// or not anything was submitted there.
pub fn plan_document(
    assignment: &Assignment,
    submissions: &SubmissionData,
    student: &StudentIdentity,
) -> DocumentPlan {
    let mut pages = vec![PageDescriptor::TitlePage(title_page(assignment, student))];

    for (problem_index, problem) in assignment.problems.iter().enumerate() {
        if problem.has_subsections() {
            pages.push(statement_page(assignment, student, problem_index, problem));
            for (subsection_index, subsection) in problem.subsections.iter().enumerate() {
                let unit = AnswerUnit {
                    slot: SlotId::subsection(problem_index, subsection_index),
                    points: subsection.points,
                    statement: &subsection.subsection_statement,
                    image: None,
                    elements: &subsection.submission_elements,
                    capacity: subsection.image_capacity(),
                };
                unit.emit(assignment, student, submissions, &mut pages);
            }
        } else {
            let unit = AnswerUnit {
                slot: SlotId::problem(problem_index),
                points: problem.points,
                statement: &problem.problem_statement,
                image: problem.problem_image.as_ref(),
                elements: problem.submission_elements(),
                capacity: problem.image_capacity(),
            };
            unit.emit(assignment, student, submissions, &mut pages);
        }
    }

    DocumentPlan { pages }
}

fn title_page(assignment: &Assignment, student: &StudentIdentity) -> TitlePagePlan {
    TitlePagePlan {
        course_code: assignment.course_code.clone(),
        course_name: assignment.course_name.clone(),
        assignment_title: assignment.assignment_title.clone(),
        preamble: assignment.preamble.clone(),
        student_name: student.name.clone(),
        student_id: student.id.clone(),
        total_points: assignment.total_points,
    }
}

fn header(assignment: &Assignment, student: &StudentIdentity, subtitle: String) -> PageHeader {
    PageHeader {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        title: assignment.course_code.clone(),
        subtitle,
    }
}

fn statement_page(
    assignment: &Assignment,
    student: &StudentIdentity,
    problem_index: usize,
    problem: &Problem,
) -> PageDescriptor {
    let label = UnitLabel::Problem {
        number: problem_index + 1,
    };
    PageDescriptor::ContentPage(ContentPage {
        header: header(assignment, student, label.main_subtitle()),
        body: PageBody::Statement {
            problem_number: label.problem_number(),
            points: problem.points,
            statement: problem.problem_statement.clone(),
            image: problem.problem_image.clone(),
        },
        has_leading_answer_marker: false,
        has_trailing_answer_marker: false,
    })
}

/// A problem without subsections, or one subsection.
struct AnswerUnit<'a> {
    slot: SlotId,
    points: f64,
    statement: &'a str,
    image: Option<&'a AssignmentImage>,
    elements: &'a [SubmissionElementKind],
    capacity: usize,
}

impl AnswerUnit<'_> {
    fn emit(
        &self,
        assignment: &Assignment,
        student: &StudentIdentity,
        submissions: &SubmissionData,
        pages: &mut Vec<PageDescriptor>,
    ) {
        let label = UnitLabel::for_slot(self.slot);
        let entry = submissions.get(self.slot);

        if self.capacity > 1 && !self.elements.contains(&SubmissionElementKind::Image) {
            debug!(
                target = "application::document::planner",
                slot = %self.slot,
                capacity = self.capacity,
                "Reserving overflow image pages for a unit without an image element"
            );
        }

        pages.push(PageDescriptor::ContentPage(ContentPage {
            header: header(assignment, student, label.main_subtitle()),
            body: PageBody::Answer(AnswerSection {
                slot: self.slot,
                label: label.clone(),
                points: self.points,
                statement: self.statement.to_string(),
                image: self.image.cloned(),
                answer: self.answer(entry),
            }),
            has_leading_answer_marker: true,
            has_trailing_answer_marker: self.capacity <= 1,
        }));

        for index in 1..self.capacity {
            let image = image_slot(entry, index, self.capacity);
            pages.push(PageDescriptor::OverflowImagePage(OverflowImagePage {
                header: header(assignment, student, label.overflow_subtitle(image.number())),
                slot: self.slot,
                image,
                is_last_overflow: index + 1 == self.capacity,
            }));
        }
    }

    /// The main-page image is counted against what was submitted; overflow
    /// pages count against the capacity.
    fn answer(&self, entry: Option<&SubmissionEntry>) -> AnswerPlan {
        let Some(entry) = entry else {
            return AnswerPlan::Missing;
        };

        let blocks = self
            .elements
            .iter()
            .filter_map(|kind| match kind {
                SubmissionElementKind::Text => entry.text().map(|content| AnswerBlock::Text {
                    content: content.to_string(),
                }),
                SubmissionElementKind::Image => Some(AnswerBlock::Image {
                    image: image_slot(Some(entry), 0, entry.image_slots_len().max(1)),
                }),
                SubmissionElementKind::AiReflective => {
                    entry.reflection().map(|content| AnswerBlock::Reflection {
                        content: content.to_string(),
                    })
                }
            })
            .collect();

        AnswerPlan::Blocks { blocks }
    }
}

fn image_slot(entry: Option<&SubmissionEntry>, index: usize, total: usize) -> ImageSlot {
    ImageSlot {
        index,
        total,
        data: entry
            .and_then(|entry| entry.image(index))
            .map(str::to_string),
    }
}
