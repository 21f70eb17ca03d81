//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Shared primitives and utilities for the RoleSync runtime."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
//! Shared primitives for the RoleSync workspace.
//! This crate exposes configuration loading and tracing initialisation
//! consumed by the daemon and the platform binding.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, DiscordConfig, LoadedAppConfig, LoggingConfig, MarkerConfig, MetricsConfig,
    SweepConfig,
};
pub use logging::{init_tracing, LogFormat};
