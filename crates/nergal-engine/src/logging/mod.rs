//! Logging setup.
//!
//! Responsibilities:
//! - install the `env_logger` backend once per process
//! - rate-limit warnings that would otherwise repeat every frame

mod init;
mod throttle;

pub use init::{LoggingConfig, init_logging};
pub use throttle::WarnThrottle;
