//! # Installsync
//!
//! Binary wiring: configuration, logging, adapters and the restart
//! supervisor.

pub mod context;
pub mod logging;
pub mod relaunch;

pub use context::AppContext;
