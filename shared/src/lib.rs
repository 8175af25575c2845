//! Shared types for the seller analytics workspace
//!
//! Error codes and the response envelope, the marketplace wire model, and
//! small time/id utilities.

pub mod error;
pub mod market;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
