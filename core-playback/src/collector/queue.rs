use super::base::{self, CollectHandle, CollectorCore, CollectorTarget, FacetCollector, RefreshSource};
use crate::observer::Facet;
use bridge_traits::{PlaybackQueue, Player, PlayerEvent};
use core_async::sync::watch;
use std::sync::Arc;

/// Tracks the queue of the observed session.
#[derive(Clone)]
pub struct QueueCollector {
    inner: Arc<QueueInner>,
}

pub(crate) struct QueueInner {
    core: CollectorCore,
    value: watch::Sender<PlaybackQueue>,
}

impl QueueCollector {
    pub(crate) fn new(core: CollectorCore) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                core,
                value: watch::channel(PlaybackQueue::empty()).0,
            }),
        }
    }

    pub(crate) fn as_facet(&self) -> Arc<dyn FacetCollector> {
        self.inner.clone()
    }

    pub fn start_collect(&self) -> CollectHandle {
        base::start_collect(&self.inner)
    }

    pub fn queue(&self) -> PlaybackQueue {
        self.inner.value.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackQueue> {
        self.inner.value.subscribe()
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }
}

impl CollectorTarget for QueueInner {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    fn publish(&self, player: Option<&Arc<dyn Player>>, _source: RefreshSource) {
        let queue = player.map(|player| player.queue()).unwrap_or_default();
        self.value.send_if_modified(|current| {
            if *current == queue {
                false
            } else {
                *current = queue;
                true
            }
        });
    }

    fn handles_event(&self, event: &PlayerEvent) -> bool {
        matches!(
            event,
            PlayerEvent::TimelineChanged | PlayerEvent::MediaItemTransition { .. }
        )
    }

    fn handles_facet(&self, facet: Facet) -> bool {
        facet == Facet::Queue
    }
}
