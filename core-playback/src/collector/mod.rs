//! # Collectors
//!
//! Per-facet views of the observed session. Each collector exposes its
//! current value plus a `watch` receiver, and is created by a
//! [`PlaybackObserver`](crate::PlaybackObserver).

mod base;
mod duration;
mod progression;
mod properties;
mod queue;

pub(crate) use base::{CollectorCore, FacetCollector};

pub use base::CollectHandle;
pub use duration::DurationCollector;
pub use progression::{
    seekbar_interval_handler, IntervalHandler, ProgressionCollector, ProgressionSample,
};
pub use properties::{PlaybackProperties, PropertiesCollector};
pub use queue::QueueCollector;
