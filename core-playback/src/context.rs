use crate::config::PlaybackConfig;
use crate::connection::PlaybackConnection;
use crate::executor::Spawner;
use bridge_traits::{Player, SessionId};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;

/// Shared wiring handed from a presenter down to its controllers, observers
/// and collectors.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub session_id: SessionId,
    pub connection: Arc<dyn PlaybackConnection>,
    pub config: PlaybackConfig,
    pub spawner: Spawner,
    pub event_bus: Option<EventBus>,
}

impl SessionContext {
    pub fn player(&self) -> Option<Arc<dyn Player>> {
        self.connection.player(&self.session_id)
    }

    pub fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}
