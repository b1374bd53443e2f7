//! Domain layer: assignment definitions and submission state.

pub mod assignment;
pub mod error;
pub mod submission;
