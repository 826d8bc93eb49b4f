//! Structured tracing vocabulary shared by every component.

pub mod events;
pub mod fields;
