//! Request validation
//!
//! Request DTOs derive `validator::Validate`; the [`Validated`] extractor
//! rejects invalid bodies with a 400 carrying per-field messages.

pub mod extractor;
pub mod validators;

pub use extractor::Validated;
