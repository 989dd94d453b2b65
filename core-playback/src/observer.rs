//! # Playback Observer
//!
//! Groups the collectors a UI surface needs for one session and receives the
//! facet refreshes a controller fans out after successful commands.
//!
//! Ownership runs strictly downward: controller owns observers, observers own
//! collectors. Children hold only weak back-references, used to detach
//! themselves on dispose.

use crate::collector::{
    CollectorCore, DurationCollector, FacetCollector, ProgressionCollector, PropertiesCollector,
    QueueCollector,
};
use crate::context::SessionContext;
use crate::controller::ControllerInner;
use bridge_traits::SessionId;
use core_async::sync::CancellationToken;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Slice of observable playback state a command can invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Queue,
    Progress,
    PlayWhenReady,
    RepeatMode,
    ShuffleMode,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Queue,
        Facet::Progress,
        Facet::PlayWhenReady,
        Facet::RepeatMode,
        Facet::ShuffleMode,
    ];

    fn slot(self) -> usize {
        match self {
            Facet::Queue => 0,
            Facet::Progress => 1,
            Facet::PlayWhenReady => 2,
            Facet::RepeatMode => 3,
            Facet::ShuffleMode => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Handle to an observer created by a [`PlaybackController`](crate::PlaybackController).
#[derive(Clone)]
pub struct PlaybackObserver {
    inner: Arc<ObserverInner>,
}

pub(crate) struct ObserverInner {
    id: ObserverId,
    ctx: SessionContext,
    scope: CancellationToken,
    controller: Weak<ControllerInner>,
    disposed: Mutex<bool>,
    collectors: Mutex<Vec<Arc<dyn FacetCollector>>>,
    refreshes: [AtomicU64; 5],
}

impl PlaybackObserver {
    pub(crate) fn new(
        ctx: SessionContext,
        scope: CancellationToken,
        controller: Weak<ControllerInner>,
    ) -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                id: ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
                ctx,
                scope,
                controller,
                disposed: Mutex::new(false),
                collectors: Mutex::new(Vec::new()),
                refreshes: Default::default(),
            }),
        }
    }

    /// Observer handed out by an already disposed controller.
    pub(crate) fn detached(ctx: SessionContext) -> Self {
        let observer = Self::new(ctx, CancellationToken::new(), Weak::new());
        observer.inner.scope.cancel();
        *observer.inner.disposed.lock() = true;
        observer
    }

    pub(crate) fn inner(&self) -> &Arc<ObserverInner> {
        &self.inner
    }

    pub fn id(&self) -> ObserverId {
        self.inner.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.ctx.session_id
    }

    pub fn create_queue_collector(&self) -> QueueCollector {
        let collector = QueueCollector::new(self.inner.collector_core());
        self.inner.adopt(collector.as_facet());
        collector
    }

    pub fn create_duration_collector(&self) -> DurationCollector {
        let collector = DurationCollector::new(self.inner.collector_core());
        self.inner.adopt(collector.as_facet());
        collector
    }

    pub fn create_progression_collector(&self) -> ProgressionCollector {
        let collector = ProgressionCollector::new(self.inner.collector_core());
        self.inner.adopt(collector.as_facet());
        collector
    }

    pub fn create_properties_collector(&self) -> PropertiesCollector {
        let collector = PropertiesCollector::new(self.inner.collector_core());
        self.inner.adopt(collector.as_facet());
        collector
    }

    /// Number of live collectors owned by this observer.
    pub fn collector_count(&self) -> usize {
        self.inner.collectors.lock().len()
    }

    /// How many controller fan-outs have refreshed `facet` on this observer.
    pub fn refresh_count(&self, facet: Facet) -> u64 {
        self.inner.refreshes[facet.slot()].load(Ordering::SeqCst)
    }

    /// Dispose every collector and detach from the controller. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        *self.inner.disposed.lock()
    }
}

impl fmt::Debug for PlaybackObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackObserver")
            .field("id", &self.inner.id)
            .field("session_id", &self.inner.ctx.session_id)
            .field("collectors", &self.collector_count())
            .finish()
    }
}

impl ObserverInner {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    fn collector_core(self: &Arc<Self>) -> CollectorCore {
        if *self.disposed.lock() {
            CollectorCore::detached(self.ctx.clone())
        } else {
            CollectorCore::new(
                self.ctx.clone(),
                self.scope.child_token(),
                Arc::downgrade(self),
            )
        }
    }

    fn adopt(&self, collector: Arc<dyn FacetCollector>) {
        let disposed = self.disposed.lock();
        if *disposed {
            drop(disposed);
            collector.dispose();
            return;
        }
        self.collectors.lock().push(collector);
    }

    pub fn remove_collector(&self, id: u64) {
        self.collectors.lock().retain(|collector| collector.id() != id);
    }

    /// Refresh every owned collector interested in any of `facets`.
    pub fn refresh(&self, facets: &[Facet]) {
        if *self.disposed.lock() {
            return;
        }
        for facet in facets {
            self.refreshes[facet.slot()].fetch_add(1, Ordering::SeqCst);
        }
        let collectors = self.collectors.lock().clone();
        for collector in collectors {
            collector.refresh_facets(facets);
        }
    }

    pub fn dispose(&self) {
        let mut disposed = self.disposed.lock();
        if *disposed {
            return;
        }
        *disposed = true;
        self.scope.cancel();

        let collectors = self.collectors.lock().clone();
        for collector in &collectors {
            collector.dispose();
            #[cfg(debug_assertions)]
            assert!(
                !self
                    .collectors
                    .lock()
                    .iter()
                    .any(|owned| owned.id() == collector.id()),
                "collector {} still attached to {} after dispose",
                collector.id(),
                self.id
            );
        }
        debug_assert!(
            collectors.iter().all(|collector| collector.is_disposed()),
            "{} disposed with live collectors",
            self.id
        );

        if let Some(controller) = self.controller.upgrade() {
            controller.remove_observer(self.id);
        }
        drop(disposed);
        debug!(observer = %self.id, collectors = collectors.len(), "Observer disposed");
    }
}
