// Shared kernel: cross-cutting concerns used by every module

pub mod config; // Explicit pipeline configuration
pub mod errors; // Shared error types
pub mod resilience; // Retry/timeout pipeline for outbound calls
pub mod utils; // Logging helpers
pub mod validation; // Rule chain used by the record validator

// Re-exports for convenience
pub use config::PipelineConfig;
pub use errors::{AppError, AppResult};
