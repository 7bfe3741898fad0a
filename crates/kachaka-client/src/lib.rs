//! `kachaka-client` – command-lifecycle client for Kachaka robots.
//!
//! Lets application code start, cancel and poll long-running robot commands
//! and read telemetry without touching wire messages.
//!
//! # Modules
//!
//! - [`client`] – [`KachakaApiClient`]: builds command requests, resolving
//!   shelf and location names first, and exposes the command lifecycle plus
//!   pass-through telemetry getters.
//! - [`resolver`] – [`ShelfLocationResolver`]: maps names to ids against an
//!   atomically swapped catalog snapshot.
//! - [`stub`] – [`KachakaStub`]: the async RPC seam every transport
//!   implements.
//! - [`sim`] – [`SimulatedRobot`]: an in-process service used by tests and
//!   the offline console.
//! - [`config`] – [`ClientConfig`]: `~/.kachaka/config.toml` with
//!   `KACHAKA_*` environment overrides.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

pub mod client;
pub mod config;
pub mod resolver;
pub mod sim;
pub mod stub;
pub mod telemetry;

pub use client::{KachakaApiClient, StartOptions};
pub use config::{ClientConfig, DEFAULT_TARGET, SimulatorConfig};
pub use resolver::ShelfLocationResolver;
pub use sim::SimulatedRobot;
pub use stub::KachakaStub;
pub use telemetry::{TracerProviderGuard, init_tracing};
