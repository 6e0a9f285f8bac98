pub mod log_producer;

pub use log_producer::{
    synthetic_event, LogProducer, ProducerConfig, ProducerMetrics, SERVICE_HOSTS,
};
