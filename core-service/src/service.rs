//! # Playback Service
//!
//! Platform-neutral core of the hosting media service. Owns the lifecycle
//! [`StateRegistry`], the [`SessionManager`], the controller presenter and the
//! event bus, and forwards host callbacks into them.
//!
//! Lifecycle contract violations are programming errors in the host: they are
//! logged and then abort via panic. Media connection failures are not fatal
//! and surface as [`MediaState::Error`].

use crate::error::Result;
use crate::lifecycle::{LifecycleError, MediaState, OwnerId, ServiceEvent, ServiceState, StateRegistry};
use bridge_traits::error::BridgeError;
use bridge_traits::{MediaSession, Player, SessionId};
use core_async::sync::CancellationToken;
use core_playback::{
    PlaybackConfig, PlaybackControlPresenter, PlaybackController, SessionManager, Spawner,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, ServiceLifecycleEvent};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct PlaybackService {
    owner: OwnerId,
    config: CoreConfig,
    states: StateRegistry,
    scope: CancellationToken,
    event_bus: EventBus,
    manager: Arc<SessionManager>,
    presenter: PlaybackControlPresenter,
}

impl PlaybackService {
    pub fn builder(config: CoreConfig) -> PlaybackServiceBuilder {
        PlaybackServiceBuilder {
            config,
            playback: PlaybackConfig::default(),
            spawner: None,
            owner: None,
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn states(&self) -> &StateRegistry {
        &self.states
    }

    pub fn service_state(&self) -> ServiceState {
        self.states.state()
    }

    pub fn media_state(&self) -> MediaState {
        self.states.media()
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    pub fn presenter(&self) -> &PlaybackControlPresenter {
        &self.presenter
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to lifecycle, session and controller events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Cancelled when the service is destroyed.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Apply a host lifecycle callback.
    ///
    /// # Panics
    ///
    /// Panics when the transition violates the lifecycle contract.
    pub fn on_event(&self, event: ServiceEvent) -> ServiceState {
        let from = self.states.state();
        match self.states.try_on_event(self.owner, event) {
            Ok(to) => {
                if to != from {
                    info!(event = %event, from = %from, to = %to, "Service state changed");
                    self.publish(ServiceLifecycleEvent::StateChanged {
                        trigger: event.to_string(),
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                to
            }
            Err(err) => self.violation(err),
        }
    }

    /// # Panics
    ///
    /// Panics when the service is already in the foreground.
    pub fn start_foreground(&self) -> ServiceState {
        let state = self.states.state();
        if state.is_foreground() {
            self.violation(LifecycleError::Repeated(state));
        }
        self.on_event(ServiceEvent::OnForeground)
    }

    /// # Panics
    ///
    /// Panics unless the service is in the foreground.
    pub fn stop_foreground(&self) -> ServiceState {
        let state = self.states.state();
        if !state.is_foreground() {
            self.violation(LifecycleError::Jump {
                from: state,
                to: ServiceState::Paused,
            });
        }
        self.on_event(ServiceEvent::OnPause)
    }

    /// Leave the foreground if needed, then stop. The session is released when
    /// asked to or when `release_session_on_stop` is enabled.
    pub fn stop(&self, release_session: bool) -> ServiceState {
        if self.states.is_foreground() {
            self.stop_foreground();
        }
        let state = self.on_event(ServiceEvent::OnStop);
        if release_session || self.config.features.release_session_on_stop {
            info!("Releasing session on stop");
            self.manager.release();
        }
        state
    }

    /// Tear down every controller, cancel the service scope and release the
    /// session.
    ///
    /// # Panics
    ///
    /// Panics while in the foreground or when `Destroyed` is not one rank away.
    pub fn destroy(&self) {
        let state = self.states.state();
        if state.is_foreground() {
            error!("Tried to release the session in the foreground");
            self.violation(LifecycleError::Jump {
                from: state,
                to: ServiceState::Destroyed,
            });
        }
        self.on_event(ServiceEvent::OnDestroy);

        self.presenter.dispose();
        self.scope.cancel();
        self.manager.release();
        assert!(
            self.scope.is_cancelled() && self.manager.scope().is_cancelled(),
            "service scope still active after destroy"
        );
        info!(owner = %self.owner, "Playback service destroyed");
    }

    fn violation(&self, err: LifecycleError) -> ! {
        error!(owner = %self.owner, error = %err, "Service lifecycle contract violated");
        panic!("service lifecycle contract violated: {}", err);
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Install the session the service hosts. Only the first call has effect.
    pub fn initialize_session(&self, session: Arc<dyn MediaSession>) -> bool {
        self.manager.initialize_session(session)
    }

    pub fn change_local_session(&self, session: Arc<dyn MediaSession>) -> bool {
        self.manager.change_local_session(session)
    }

    /// # Errors
    ///
    /// Fails when no session is installed or the manager was released.
    pub fn change_session_player(&self, player: Arc<dyn Player>, release_old: bool) -> Result<bool> {
        Ok(self.manager.change_session_player(player, release_old)?)
    }

    /// Hand the current session to a connecting client. The first call moves
    /// the media state to `Initialized`.
    pub fn on_get_session(&self) -> Option<Arc<dyn MediaSession>> {
        if self.states.media() == MediaState::Nothing {
            self.update_media(MediaState::Initialized, "onGetSession failed");
        }
        self.manager.current().map(|record| record.session)
    }

    pub fn on_connect(&self, outcome: std::result::Result<(), BridgeError>) -> MediaState {
        self.settle_media(outcome, MediaState::Connecting, "onConnect failed, rejecting")
    }

    pub fn on_post_connect(&self, outcome: std::result::Result<(), BridgeError>) -> MediaState {
        self.settle_media(outcome, MediaState::Connected, "onPostConnect failed")
    }

    pub fn on_disconnected(&self, outcome: std::result::Result<(), BridgeError>) -> MediaState {
        self.settle_media(outcome, MediaState::Disconnected, "onDisconnected failed")
    }

    fn settle_media(
        &self,
        outcome: std::result::Result<(), BridgeError>,
        target: MediaState,
        context: &str,
    ) -> MediaState {
        match outcome {
            Ok(()) => self.update_media(target, context),
            Err(err) => self.fail_media(err, context),
        }
    }

    fn update_media(&self, target: MediaState, context: &str) -> MediaState {
        let from = self.states.media();
        match self.states.try_update_media_state(target) {
            Ok(to) => {
                if to != from {
                    self.publish(ServiceLifecycleEvent::MediaStateChanged {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                to
            }
            Err(err) => self.fail_media(err, context),
        }
    }

    fn fail_media(&self, cause: impl fmt::Display, context: &str) -> MediaState {
        let from = self.states.media();
        match self.states.try_update_media_state(MediaState::error(&cause, context)) {
            Ok(to) => {
                warn!(cause = %cause, "{}", context);
                self.publish(ServiceLifecycleEvent::MediaStateChanged {
                    from: from.to_string(),
                    to: to.to_string(),
                });
                self.publish(ServiceLifecycleEvent::ConnectionError {
                    message: format!("{}: {}", context, cause),
                });
                to
            }
            Err(err) => {
                warn!(cause = %cause, error = %err, "Media state already terminal");
                from
            }
        }
    }

    // ========================================================================
    // Controllers
    // ========================================================================

    /// Controller bound to the configured local session id.
    pub fn create_controller(&self) -> PlaybackController {
        self.presenter
            .create_controller(self.config.session_id.clone())
    }

    pub fn create_controller_for(&self, session_id: SessionId) -> PlaybackController {
        self.presenter.create_controller(session_id)
    }

    fn publish(&self, event: ServiceLifecycleEvent) {
        if self.config.features.publish_events {
            let _ = self.event_bus.emit(CoreEvent::Service(event));
        }
    }
}

impl fmt::Debug for PlaybackService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackService")
            .field("owner", &self.owner)
            .field("states", &self.states)
            .field("controllers", &self.presenter.controller_count())
            .finish()
    }
}

pub struct PlaybackServiceBuilder {
    config: CoreConfig,
    playback: PlaybackConfig,
    spawner: Option<Spawner>,
    owner: Option<OwnerId>,
}

impl PlaybackServiceBuilder {
    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    /// Run controller tasks on a specific runtime. Defaults to the runtime
    /// driving [`build`](Self::build).
    pub fn spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Drive the lifecycle under a caller-chosen identity.
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Validate both configurations, wire the components and enter
    /// `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`](crate::CoreError::Config) or
    /// [`CoreError::Playback`](crate::CoreError::Playback) for invalid settings,
    /// and `CoreError::Playback(PlaybackError::NoRuntime)` when built outside a
    /// Tokio runtime without an explicit spawner.
    pub fn build(self) -> Result<PlaybackService> {
        self.config.validate()?;

        let event_bus = EventBus::new(self.config.event_buffer_size);
        let publish = self.config.features.publish_events;
        let scope = CancellationToken::new();
        let manager = Arc::new(SessionManager::new(
            &scope,
            publish.then(|| event_bus.clone()),
        ));

        let mut presenter = PlaybackControlPresenter::builder(manager.clone())
            .config(self.playback)
            .parent_scope(&scope);
        if let Some(spawner) = self.spawner {
            presenter = presenter.spawner(spawner);
        }
        if publish {
            presenter = presenter.event_bus(event_bus.clone());
        }
        let presenter = presenter.build()?;

        let service = PlaybackService {
            owner: self.owner.unwrap_or_default(),
            config: self.config,
            states: StateRegistry::new(),
            scope,
            event_bus,
            manager,
            presenter,
        };
        service.on_event(ServiceEvent::OnInitialize);
        Ok(service)
    }
}
