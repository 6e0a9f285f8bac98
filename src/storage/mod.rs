pub mod index;
pub mod log_store;
pub mod partition;
pub mod retention;
pub mod util;

pub use log_store::LogStore;
pub use partition::TimePartition;
pub use retention::RetentionEvictor;
pub use util::{EvictionReport, EvictionTrigger, RetentionConfig, StoreConfig, StoreStats};
