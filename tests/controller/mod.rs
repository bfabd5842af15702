//! Play session controller tests.
//!
//! These run on a paused tokio clock, so sleeping advances timers
//! deterministically.

mod concurrency_tests;
mod visibility_tests;
