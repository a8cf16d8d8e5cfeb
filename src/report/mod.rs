// src/report/mod.rs

//! Result reporting.
//!
//! - [`reporter`] keeps every snapshot a run publishes and lets observers
//!   follow them as a finite stream ending at the terminal snapshot.
//! - [`summary`] renders a finished run for humans.

pub mod reporter;
pub mod summary;

pub use reporter::{Reporter, Subscription};
pub use summary::ExecutionReport;
