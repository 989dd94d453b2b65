use super::base::{self, CollectHandle, CollectorCore, CollectorTarget, FacetCollector, RefreshSource};
use crate::observer::Facet;
use bridge_traits::{Player, PlayerEvent};
use core_async::sync::watch;
use std::sync::Arc;
use std::time::Duration;

/// Tracks the duration of the current media item. `None` while unknown.
#[derive(Clone)]
pub struct DurationCollector {
    inner: Arc<DurationInner>,
}

pub(crate) struct DurationInner {
    core: CollectorCore,
    value: watch::Sender<Option<Duration>>,
}

impl DurationCollector {
    pub(crate) fn new(core: CollectorCore) -> Self {
        Self {
            inner: Arc::new(DurationInner {
                core,
                value: watch::channel(None).0,
            }),
        }
    }

    pub(crate) fn as_facet(&self) -> Arc<dyn FacetCollector> {
        self.inner.clone()
    }

    pub fn start_collect(&self) -> CollectHandle {
        base::start_collect(&self.inner)
    }

    pub fn duration(&self) -> Option<Duration> {
        *self.inner.value.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Duration>> {
        self.inner.value.subscribe()
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }
}

impl CollectorTarget for DurationInner {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    fn publish(&self, player: Option<&Arc<dyn Player>>, _source: RefreshSource) {
        let duration = player.and_then(|player| player.progress().duration);
        self.value.send_if_modified(|current| {
            let changed = *current != duration;
            *current = duration;
            changed
        });
    }

    fn handles_event(&self, event: &PlayerEvent) -> bool {
        matches!(
            event,
            PlayerEvent::MediaItemTransition { .. }
                | PlayerEvent::TimelineChanged
                | PlayerEvent::PlaybackStateChanged(_)
        )
    }

    fn handles_facet(&self, facet: Facet) -> bool {
        facet == Facet::Queue
    }
}
