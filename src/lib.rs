//! GradeBridge print core.
//!
//! Segments assignment text into prose and TeX formulas, typesets the
//! formulas through a pluggable math backend, and lays a submission out as a
//! fixed sequence of printable pages.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
