pub mod query_service;

pub use query_service::{validate_time_range, LogQueryService, QueryError, QueryResult};
