//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the playback session core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its configuration types and the broadcast channel used to publish
//! lifecycle, session and controller activity to the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
