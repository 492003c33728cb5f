#![forbid(unsafe_code)]

//! Core: configuration, logging, easing, and cooperative frame scheduling for
//! the daylog grouped list.

pub mod config;
pub mod easing;
pub mod logging;
pub mod scheduler;

pub use config::{ConfigError, Density, ListConfig, ListConfigParse, should_virtualize};
pub use scheduler::{FrameScheduler, TaskHandle};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace, trace_span, warn};
