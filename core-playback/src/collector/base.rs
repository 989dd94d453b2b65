//! Lifecycle shared by every collector kind.
//!
//! A collector starts idle. `start_collect` attaches an engine listener and a
//! player-changed listener through the connection and publishes the first
//! value; `dispose` detaches both, cancels the collector scope and removes the
//! collector from its observer. Listener adapters hold only a weak reference
//! to the collector.

use crate::context::SessionContext;
use crate::listeners::OnChanged;
use crate::observer::{Facet, ObserverInner};
use bridge_traits::{Player, PlayerEvent, PlayerListener};
use core_async::sync::{watch, CancellationToken};
use core_async::task::JoinHandle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

static NEXT_COLLECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Why a collector re-read the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshSource {
    Start,
    Event,
    PlayerChanged,
    Facet,
    Poll,
}

struct Attachment {
    engine: Arc<dyn PlayerListener>,
    changed: Arc<dyn OnChanged<dyn Player>>,
}

#[derive(Default)]
struct CoreState {
    started: bool,
    attachment: Option<Attachment>,
}

pub(crate) struct CollectorCore {
    id: u64,
    pub(crate) ctx: SessionContext,
    pub(crate) scope: CancellationToken,
    observer: Weak<ObserverInner>,
    disposed: AtomicBool,
    state: Mutex<CoreState>,
    primed: watch::Sender<bool>,
}

impl CollectorCore {
    pub fn new(ctx: SessionContext, scope: CancellationToken, observer: Weak<ObserverInner>) -> Self {
        Self {
            id: NEXT_COLLECTOR_ID.fetch_add(1, Ordering::Relaxed),
            ctx,
            scope,
            observer,
            disposed: AtomicBool::new(false),
            state: Mutex::new(CoreState::default()),
            primed: watch::channel(false).0,
        }
    }

    /// Core of a collector handed out by an already disposed observer.
    pub fn detached(ctx: SessionContext) -> Self {
        let core = Self::new(ctx, CancellationToken::new(), Weak::new());
        core.scope.cancel();
        core.disposed.store(true, Ordering::SeqCst);
        core
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Behaviour a concrete collector plugs into the shared lifecycle.
pub(crate) trait CollectorTarget: Send + Sync + 'static {
    fn core(&self) -> &CollectorCore;

    /// Read the engine (or the empty state when `player` is `None`) and
    /// publish the result.
    fn publish(&self, player: Option<&Arc<dyn Player>>, source: RefreshSource);

    fn handles_event(&self, event: &PlayerEvent) -> bool;

    fn handles_facet(&self, facet: Facet) -> bool;

    /// Called once, after the first `start_collect`.
    fn on_started(self: &Arc<Self>) {}

    fn on_refreshed(&self, _source: RefreshSource) {}
}

/// Object-safe view used by observers to drive their collectors.
pub(crate) trait FacetCollector: Send + Sync {
    fn id(&self) -> u64;

    fn refresh_facets(&self, facets: &[Facet]);

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

impl<C: CollectorTarget> FacetCollector for C {
    fn id(&self) -> u64 {
        self.core().id
    }

    fn refresh_facets(&self, facets: &[Facet]) {
        if facets.iter().any(|facet| self.handles_facet(*facet)) {
            refresh(self, RefreshSource::Facet);
        }
    }

    fn dispose(&self) {
        dispose(self);
    }

    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }
}

pub(crate) fn refresh<C: CollectorTarget + ?Sized>(target: &C, source: RefreshSource) {
    let core = target.core();
    if core.is_disposed() {
        return;
    }
    let player = core.ctx.player();
    trace!(collector = core.id, ?source, has_player = player.is_some(), "Refreshing collector");
    target.publish(player.as_ref(), source);
    core.primed.send_replace(true);
    target.on_refreshed(source);
}

pub(crate) fn start_collect<C: CollectorTarget>(target: &Arc<C>) -> CollectHandle {
    let core = target.core();
    let first_start = {
        let mut state = core.state.lock();
        if core.is_disposed() {
            return CollectHandle::disposed();
        }
        if state.started {
            false
        } else {
            let bridge = Arc::new(EngineBridge {
                target: Arc::downgrade(target),
            });
            let engine: Arc<dyn PlayerListener> = bridge.clone();
            let changed: Arc<dyn OnChanged<dyn Player>> = bridge;
            core.ctx.connection.register_player_listener(engine.clone());
            core.ctx.connection.register_player_changed(changed.clone());
            state.attachment = Some(Attachment { engine, changed });
            state.started = true;
            true
        }
    };

    if first_start {
        target.on_started();
    }

    let weak = Arc::downgrade(target);
    let scope = core.scope.clone();
    let mut primed = core.primed.subscribe();
    let handle = core.ctx.spawner.spawn(async move {
        if first_start {
            if let Some(target) = weak.upgrade() {
                refresh(&*target, RefreshSource::Start);
            }
        }
        loop {
            if *primed.borrow() {
                return true;
            }
            core_async::select! {
                _ = scope.cancelled() => return false,
                changed = primed.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    });

    CollectHandle {
        handle: Some(handle),
    }
}

pub(crate) fn dispose<C: CollectorTarget + ?Sized>(target: &C) {
    let core = target.core();
    let attachment = {
        let mut state = core.state.lock();
        if core.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        state.attachment.take()
    };

    core.scope.cancel();
    if let Some(attachment) = attachment {
        core.ctx
            .connection
            .unregister_player_listener(&attachment.engine);
        core.ctx
            .connection
            .unregister_player_changed(&attachment.changed);
    }
    if let Some(observer) = core.observer.upgrade() {
        observer.remove_collector(core.id);
    }
    trace!(collector = core.id, "Collector disposed");
}

/// Forwards engine and player-changed notifications to a collector.
struct EngineBridge<C> {
    target: Weak<C>,
}

impl<C: CollectorTarget> PlayerListener for EngineBridge<C> {
    fn on_event(&self, event: &PlayerEvent) {
        if let Some(target) = self.target.upgrade() {
            if target.handles_event(event) {
                refresh(&*target, RefreshSource::Event);
            }
        }
    }
}

impl<C: CollectorTarget> OnChanged<dyn Player> for EngineBridge<C> {
    fn on_changed(&self, _old: Option<&Arc<dyn Player>>, _new: &Arc<dyn Player>) {
        if let Some(target) = self.target.upgrade() {
            refresh(&*target, RefreshSource::PlayerChanged);
        }
    }
}

/// Completes once a collector has published its first value.
#[derive(Debug)]
pub struct CollectHandle {
    handle: Option<JoinHandle<bool>>,
}

impl CollectHandle {
    fn disposed() -> Self {
        Self { handle: None }
    }

    /// Wait for the first value. Returns `false` if the collector was
    /// disposed before one was published.
    pub async fn wait(self) -> bool {
        match self.handle {
            Some(handle) => handle.await.unwrap_or(false),
            None => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}
