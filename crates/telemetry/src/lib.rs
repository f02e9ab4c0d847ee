//! Observability and metrics for the History Atlas API.

pub mod metrics;
pub mod logging;

pub use metrics::Metrics;
pub use logging::init_logging;
