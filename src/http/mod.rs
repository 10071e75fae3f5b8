//! HTTP module
//!
//! axum router and error mapping for the HealthGo API.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{router, AppState, RangeParams, UNPARSEABLE_ROWS_HEADER};
