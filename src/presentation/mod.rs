//! Presentation helpers shared by the print pipeline.

pub mod print;
