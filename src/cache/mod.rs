//! In-memory caches.
//!
//! Currently holds typeset formulas so repeated expressions across a printed
//! document only pass through the math backend once.

mod math;

pub use math::{DEFAULT_MATH_CACHE_CAPACITY, MathRenderCache};
