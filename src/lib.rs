pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod telemetry;

pub use config::{AppConfig, PipelineConfig, RetryPolicy, TimeRange, VerificationDepth};
pub use error::{ExternalError, PipelineError, PipelineResult};
