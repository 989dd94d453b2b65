//! # Playback Session Module
//!
//! Owns the current media session and offers controllers and observers on
//! top of it.
//!
//! ## Overview
//!
//! This module handles:
//! - The session registry: one current `(session, player)` pair, atomic swaps
//!   and listener fan-out across player changes
//! - Playback controllers issuing transport commands and compare-and-set
//!   batches
//! - Observers and their collectors (queue, duration, progression,
//!   properties) exposing observable state to UI surfaces
//!
//! ## Ownership
//!
//! ```text
//! PlaybackControlPresenter ─┬─ PlaybackController ─┬─ PlaybackObserver ─┬─ QueueCollector
//!                           │                      │                    ├─ DurationCollector
//!                           │                      │                    └─ ...
//!                           │                      └─ PlaybackObserver
//!                           └─ PlaybackController
//! ```
//!
//! Each level owns the next through a cancellation scope; disposing a node
//! disposes everything below it.

pub mod collector;
pub mod config;
pub mod connection;
mod context;
pub mod controller;
pub mod error;
pub mod executor;
pub mod listeners;
pub mod manager;
pub mod observer;
pub mod presenter;
pub mod registry;

pub use collector::{
    seekbar_interval_handler, CollectHandle, DurationCollector, IntervalHandler,
    PlaybackProperties, ProgressionCollector, ProgressionSample, PropertiesCollector,
    QueueCollector,
};
pub use config::PlaybackConfig;
pub use connection::PlaybackConnection;
pub use controller::{
    Command, CompareAndSet, ControllerId, FanOutHandle, FieldWrite, PlaybackController,
    PlaybackSnapshot, RequestResult,
};
pub use error::{PlaybackError, Result};
pub use executor::Spawner;
pub use listeners::{on_changed, ListenerRegistry, OnChanged};
pub use manager::SessionManager;
pub use observer::{Facet, ObserverId, PlaybackObserver};
pub use presenter::{PlaybackControlPresenter, PresenterBuilder};
pub use registry::{SessionRecord, SessionRegistry};
