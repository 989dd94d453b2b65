use super::base::{self, CollectHandle, CollectorCore, CollectorTarget, FacetCollector, RefreshSource};
use crate::observer::Facet;
use bridge_traits::{
    EngineState, PlaybackQueue, Player, PlayerEvent, PlayerProperties, RepeatMode, ShuffleMode,
};
use core_async::sync::watch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transport state plus which commands are currently meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackProperties {
    pub engine_state: EngineState,
    pub play_when_ready: bool,
    pub playing: bool,
    pub repeat_mode: RepeatMode,
    pub shuffle_mode: ShuffleMode,

    pub can_play: bool,
    pub can_pause: bool,
    pub can_play_when_ready: bool,
    pub can_seek_next: bool,
    pub can_seek_previous: bool,
    pub can_repeat_off: bool,
    pub can_repeat_one: bool,
    pub can_repeat_all: bool,
    pub can_shuffle_on: bool,
    pub can_shuffle_off: bool,
}

impl PlaybackProperties {
    pub fn from_snapshot(queue: &PlaybackQueue, properties: &PlayerProperties) -> Self {
        let has_items = !queue.is_empty();
        Self {
            engine_state: properties.engine_state,
            play_when_ready: properties.play_when_ready,
            playing: properties.is_playing,
            repeat_mode: properties.repeat_mode,
            shuffle_mode: properties.shuffle_mode,
            can_play: has_items,
            can_pause: properties.play_when_ready,
            can_play_when_ready: has_items,
            can_seek_next: properties.has_next,
            can_seek_previous: properties.has_previous,
            can_repeat_off: true,
            can_repeat_one: has_items,
            can_repeat_all: has_items,
            can_shuffle_on: queue.len() > 1,
            can_shuffle_off: true,
        }
    }

    /// Whether the next mode in the `Off -> One -> All -> Off` cycle is
    /// currently allowed.
    pub fn can_toggle_repeat(&self) -> bool {
        match self.repeat_mode.toggled() {
            RepeatMode::Off => self.can_repeat_off,
            RepeatMode::One => self.can_repeat_one,
            RepeatMode::All => self.can_repeat_all,
        }
    }

    pub fn can_toggle_shuffle(&self) -> bool {
        match self.shuffle_mode.toggled() {
            ShuffleMode::On => self.can_shuffle_on,
            ShuffleMode::Off => self.can_shuffle_off,
        }
    }
}

/// Tracks [`PlaybackProperties`] of the observed session.
#[derive(Clone)]
pub struct PropertiesCollector {
    inner: Arc<PropertiesInner>,
}

pub(crate) struct PropertiesInner {
    core: CollectorCore,
    value: watch::Sender<PlaybackProperties>,
}

impl PropertiesCollector {
    pub(crate) fn new(core: CollectorCore) -> Self {
        Self {
            inner: Arc::new(PropertiesInner {
                core,
                value: watch::channel(PlaybackProperties::default()).0,
            }),
        }
    }

    pub(crate) fn as_facet(&self) -> Arc<dyn FacetCollector> {
        self.inner.clone()
    }

    pub fn start_collect(&self) -> CollectHandle {
        base::start_collect(&self.inner)
    }

    pub fn properties(&self) -> PlaybackProperties {
        *self.inner.value.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackProperties> {
        self.inner.value.subscribe()
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }
}

impl CollectorTarget for PropertiesInner {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    fn publish(&self, player: Option<&Arc<dyn Player>>, _source: RefreshSource) {
        let properties = player
            .map(|player| PlaybackProperties::from_snapshot(&player.queue(), &player.properties()))
            .unwrap_or_default();
        self.value.send_if_modified(|current| {
            let changed = *current != properties;
            *current = properties;
            changed
        });
    }

    fn handles_event(&self, event: &PlayerEvent) -> bool {
        !matches!(event, PlayerEvent::PositionDiscontinuity { .. })
    }

    fn handles_facet(&self, facet: Facet) -> bool {
        matches!(
            facet,
            Facet::Queue | Facet::PlayWhenReady | Facet::RepeatMode | Facet::ShuffleMode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(len: usize) -> PlaybackQueue {
        let items = (0..len).map(|i| format!("m{i}")).collect::<Vec<_>>();
        let index = if len == 0 { None } else { Some(0) };
        PlaybackQueue::new(items, index).unwrap()
    }

    #[test]
    fn empty_queue_disables_transport() {
        let props = PlaybackProperties::from_snapshot(&queue(0), &PlayerProperties::default());
        assert!(!props.can_play);
        assert!(!props.can_repeat_one);
        assert!(!props.can_shuffle_on);
        assert!(props.can_shuffle_off);
        assert!(props.can_repeat_off);
    }

    #[test]
    fn shuffle_needs_more_than_one_item() {
        let props = PlaybackProperties::from_snapshot(&queue(1), &PlayerProperties::default());
        assert!(props.can_play);
        assert!(!props.can_shuffle_on);
        assert!(!props.can_toggle_shuffle());

        let props = PlaybackProperties::from_snapshot(&queue(2), &PlayerProperties::default());
        assert!(props.can_toggle_shuffle());
    }

    #[test]
    fn repeat_toggle_checks_next_mode() {
        let mut engine = PlayerProperties::default();
        let props = PlaybackProperties::from_snapshot(&queue(0), &engine);
        // Off -> One needs items
        assert!(!props.can_toggle_repeat());

        engine.repeat_mode = RepeatMode::All;
        let props = PlaybackProperties::from_snapshot(&queue(0), &engine);
        // All -> Off is always allowed
        assert!(props.can_toggle_repeat());

        engine.repeat_mode = RepeatMode::One;
        let props = PlaybackProperties::from_snapshot(&queue(3), &engine);
        assert!(props.can_toggle_repeat());
    }

    #[test]
    fn shuffle_off_toggle_always_allowed() {
        let engine = PlayerProperties {
            shuffle_mode: ShuffleMode::On,
            ..Default::default()
        };
        let props = PlaybackProperties::from_snapshot(&queue(0), &engine);
        assert!(props.can_toggle_shuffle());
    }
}
