//! # Playback Control Presenter
//!
//! Factory and tracker for [`PlaybackController`]s. Controllers created by
//! one presenter share a compare-and-set lock, an execution context and a
//! cancellation scope that is a child of the host's scope.

use crate::config::PlaybackConfig;
use crate::connection::PlaybackConnection;
use crate::context::SessionContext;
use crate::controller::{ControllerId, PlaybackController};
use crate::error::Result;
use crate::executor::Spawner;
use bridge_traits::SessionId;
use core_async::sync::{CancellationToken, Mutex as AsyncMutex};
use core_runtime::events::{EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PlaybackControlPresenter {
    shared: Arc<PresenterShared>,
}

pub(crate) struct PresenterShared {
    connection: Arc<dyn PlaybackConnection>,
    config: PlaybackConfig,
    spawner: Spawner,
    event_bus: Option<EventBus>,
    scope: CancellationToken,
    cas_lock: Arc<AsyncMutex<()>>,
    disposed: AtomicBool,
    controllers: Mutex<Vec<PlaybackController>>,
}

impl PlaybackControlPresenter {
    pub fn builder(connection: Arc<dyn PlaybackConnection>) -> PresenterBuilder {
        PresenterBuilder {
            connection,
            config: PlaybackConfig::default(),
            spawner: None,
            event_bus: None,
            parent: None,
        }
    }

    /// Create a controller for `session_id`. A disposed presenter returns an
    /// already disposed controller.
    pub fn create_controller(&self, session_id: SessionId) -> PlaybackController {
        let ctx = SessionContext {
            session_id: session_id.clone(),
            connection: self.shared.connection.clone(),
            config: self.shared.config.clone(),
            spawner: self.shared.spawner.clone(),
            event_bus: self.shared.event_bus.clone(),
        };

        let mut controllers = self.shared.controllers.lock();
        if self.is_disposed() {
            debug!(session_id = %session_id, "Presenter disposed; handing out inert controller");
            return PlaybackController::detached(ctx);
        }

        let controller = PlaybackController::new(
            ctx.clone(),
            self.shared.scope.child_token(),
            Arc::downgrade(&self.shared),
            self.shared.cas_lock.clone(),
        );
        controllers.push(controller.clone());
        drop(controllers);

        debug!(session_id = %session_id, controller = %controller.id(), "Controller created");
        ctx.emit(PlaybackEvent::ControllerCreated {
            session_id: session_id.to_string(),
            controller_id: controller.id().to_string(),
        });
        controller
    }

    pub fn controller_count(&self) -> usize {
        self.shared.controllers.lock().len()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }

    /// Dispose every tracked controller and cancel the presenter scope.
    /// Idempotent.
    pub fn dispose(&self) {
        let controllers = {
            let controllers = self.shared.controllers.lock();
            if self.shared.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
            controllers.clone()
        };

        for controller in &controllers {
            controller.dispose();
        }
        self.shared.scope.cancel();
        info!(controllers = controllers.len(), "Playback presenter disposed");
    }
}

impl PresenterShared {
    pub(crate) fn release_controller(&self, id: ControllerId) {
        self.controllers
            .lock()
            .retain(|controller| controller.id() != id);
    }
}

pub struct PresenterBuilder {
    connection: Arc<dyn PlaybackConnection>,
    config: PlaybackConfig,
    spawner: Option<Spawner>,
    event_bus: Option<EventBus>,
    parent: Option<CancellationToken>,
}

impl PresenterBuilder {
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Run fan-out and polling tasks on a specific runtime.
    pub fn spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Scope whose cancellation also cancels every controller.
    pub fn parent_scope(mut self, parent: &CancellationToken) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// # Errors
    ///
    /// Fails for an invalid configuration, or with
    /// [`PlaybackError::NoRuntime`](crate::PlaybackError::NoRuntime) when no
    /// spawner was given and the caller is outside a Tokio runtime.
    pub fn build(self) -> Result<PlaybackControlPresenter> {
        self.config.validate()?;
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => Spawner::current()?,
        };
        let scope = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Ok(PlaybackControlPresenter {
            shared: Arc::new(PresenterShared {
                connection: self.connection,
                config: self.config,
                spawner,
                event_bus: self.event_bus,
                scope,
                cas_lock: Arc::new(AsyncMutex::new(())),
                disposed: AtomicBool::new(false),
                controllers: Mutex::new(Vec::new()),
            }),
        })
    }
}
