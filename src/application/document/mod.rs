//! Print document planning.

mod planner;
mod types;

pub use planner::plan_document;
pub use types::{
    AnswerBlock, AnswerPlan, AnswerSection, ContentPage, DocumentPlan, ImageSlot,
    OverflowImagePage, PageBody, PageDescriptor, PageHeader, TitlePagePlan, UnitLabel,
    part_letter,
};
