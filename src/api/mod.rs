//! HTTP client for the LabRig API.

mod client;
mod error;

pub use client::{ApiClient, ApiResponse};
pub use error::ApiError;
