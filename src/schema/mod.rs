//! Host record layout
//!
//! The case-management system stores every record as a task carrying a form
//! of answers keyed by item codes. This module defines that layout and the
//! one place where it is mapped to and from the typed records of [`crate::types`].

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
