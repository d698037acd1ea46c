//! Application shell for the Dialer call-session core.
//!
//! Wires the session store, voice engines, and API client into the
//! [`ScreenController`], which drives the Welcome → Request → Call flow
//! (with Settings as a side trip). Configuration comes from a TOML file
//! with environment-variable overrides.

pub mod config;
pub mod controller;

pub use config::{load_config, Config, ConfigError};
pub use controller::{format_duration, Screen, ScreenController};
