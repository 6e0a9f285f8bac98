//! Range-validating query facade over [`LogStore`].
//!
//! The store assumes `from <= to`; this layer is where inverted ranges get
//! rejected before they reach it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{core::LogEvent, storage::LogStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid time range: 'startTimeMillis' must be <= 'endTimeMillis' (got {from} > {to})")]
    InvalidTimeRange { from: i64, to: i64 },

    #[error("Global index is disabled")]
    GlobalIndexDisabled,
}

pub type QueryResult = std::result::Result<Vec<Arc<LogEvent>>, QueryError>;

pub struct LogQueryService {
    store: Arc<LogStore>,
}

impl LogQueryService {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    pub fn logs_by_service(&self, service_name: &str, from: i64, to: i64) -> QueryResult {
        validate_time_range(from, to)?;
        info!(service = service_name, from, to, "Fetching logs for service");
        let logs = self.store.query_by_service(service_name, from, to);
        debug!(service = service_name, count = logs.len(), "Found logs for service");
        Ok(logs)
    }

    pub fn logs_by_host(&self, host_id: &str, from: i64, to: i64) -> QueryResult {
        validate_time_range(from, to)?;
        info!(host = host_id, from, to, "Fetching logs for host");
        let logs = self.store.query_by_host(host_id, from, to);
        debug!(host = host_id, count = logs.len(), "Found logs for host");
        Ok(logs)
    }

    pub fn logs_by_service_and_host(
        &self,
        service_name: &str,
        host_id: &str,
        from: i64,
        to: i64,
    ) -> QueryResult {
        validate_time_range(from, to)?;
        info!(
            service = service_name,
            host = host_id,
            from,
            to,
            "Fetching logs for service and host"
        );
        let logs = self.store.query_by_service_and_host(service_name, host_id, from, to);
        debug!(service = service_name, host = host_id, count = logs.len(), "Found logs");
        Ok(logs)
    }

    pub fn global_logs(&self, from: i64, to: i64) -> QueryResult {
        if !self.store.has_global_index() {
            return Err(QueryError::GlobalIndexDisabled);
        }
        validate_time_range(from, to)?;
        info!(from, to, "Fetching global logs");
        Ok(self.store.query_global(from, to))
    }
}

/// Rejects `from > to`.
pub fn validate_time_range(from: i64, to: i64) -> Result<(), QueryError> {
    if from > to {
        warn!(from, to, "Invalid time range: startTimeMillis > endTimeMillis");
        return Err(QueryError::InvalidTimeRange { from, to });
    }
    Ok(())
}
