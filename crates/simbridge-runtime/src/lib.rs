//! `simbridge-runtime` – the autopilot side of the bridge.
//!
//! # Modules
//!
//! - [`client`] – [`BridgeClient`][client::BridgeClient]: a blocking
//!   `reqwest` client for the control API, behind the
//!   [`BridgeApi`][client::BridgeApi] trait so the loop can be driven by a
//!   fake in tests.
//! - [`navigator`] – [`NavigationLoop`][navigator::NavigationLoop]: the
//!   reactive perceive/decide/act cycle, with single-goal and corner-tour
//!   presets.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with optional OTLP export.

pub mod client;
pub mod navigator;
pub mod telemetry;

pub use client::{BridgeApi, BridgeClient, ClientError, Reply, DEFAULT_TIMEOUT};
pub use navigator::{
    decide, CaptureMode, Decision, Goal, NavigationError, NavigationLoop, NavigationReport,
    NavigatorConfig, ProximityRule, SelfTest,
};
pub use telemetry::{init_tracing, LogFormat, TracerProviderGuard};
