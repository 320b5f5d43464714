//! API handlers
//!
//! This module contains all the API endpoint handlers organized by resource.
//! Each handler follows a consistent pattern:
//! - Extract state and parameters using Axum extractors
//! - Call the ledger service
//! - Map the result to a response; business outcomes become status codes,
//!   faults become `ApiError`

pub mod account;
pub mod response;
pub mod status;
pub mod transaction;

// Re-export the response module for easy access
pub use response::ApiListResponse;
