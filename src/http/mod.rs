//! HTTP API module for Logvault
//!
//! Provides REST endpoints for:
//! - Range queries by service, host, service and host, or globally
//! - Event ingestion
//! - Retention sweeps and store statistics

pub mod server;

pub use server::{
    create_server, start_server, ApiError, AppState, ErrorResponse, IngestResponse,
    SuccessResponse, TimeRangeParams,
};
