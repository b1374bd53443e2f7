//! Application services: math rendering, segmentation, planning and printing.

pub mod document;
pub mod error;
pub mod math;
pub mod print;
pub mod richtext;
pub mod segment;
