//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, UplinkConfig, ServicesConfig)
//! - [`nick`]: Nickname registry policy (expiry, kill delays, bad-password limits)
//! - [`chan`]: Channel registry policy (expiry, list capacities, bounce threshold)
//! - [`oper`]: Network policing policy (root list, autokill, sessions, clones)
//!
//! Everything the original kept in process-wide globals (read-only mode,
//! expiry windows, enforcement delays) lives here and is handed to the
//! core at construction.

mod chan;
mod nick;
mod oper;
mod types;

pub use chan::ChanServConfig;
pub use nick::NickServConfig;
pub use oper::OperServConfig;
pub use types::{Config, ConfigError, DatabaseConfig, ServicesConfig, UplinkConfig};
