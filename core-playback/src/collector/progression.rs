//! Position tracking.
//!
//! Besides reacting to engine events, a progression collector polls the
//! engine while an interval handler says so. The handler is consulted after
//! every refresh; results below [`PlaybackConfig::min_poll_interval`] mean
//! "don't poll" and the collector then waits for the next event or command.

use super::base::{self, CollectHandle, CollectorCore, CollectorTarget, FacetCollector, RefreshSource};
use crate::config::PlaybackConfig;
use crate::observer::Facet;
use bridge_traits::{Player, PlayerEvent};
use core_async::sync::{watch, Notify};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Position reading published by a [`ProgressionCollector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionSample {
    pub position: Duration,
    pub buffered_position: Duration,
    pub duration: Option<Duration>,
    pub speed: f32,
    pub is_playing: bool,
    /// Produced in response to an engine event rather than a poll.
    pub is_event: bool,
}

impl Default for ProgressionSample {
    fn default() -> Self {
        Self {
            position: Duration::ZERO,
            buffered_position: Duration::ZERO,
            duration: None,
            speed: 1.0,
            is_playing: false,
            is_event: false,
        }
    }
}

/// Decides how long to wait before the next poll. `None` disables polling.
pub type IntervalHandler = Arc<dyn Fn(&ProgressionSample) -> Option<Duration> + Send + Sync>;

/// Poll often enough for a seek bar `width_px` pixels wide to move one pixel
/// per update.
///
/// Yields `duration / width / speed` when that is above the polling floor,
/// capped at the configured maximum; otherwise `None`.
pub fn seekbar_interval_handler(width_px: u32, config: &PlaybackConfig) -> IntervalHandler {
    let floor = config.min_poll_interval;
    let ceiling = config.max_poll_interval;
    Arc::new(move |sample: &ProgressionSample| {
        if width_px == 0 || sample.speed.is_nan() || sample.speed <= 0.0 {
            return None;
        }
        let duration = sample.duration?;
        let secs = duration.as_secs_f64() / (f64::from(width_px) * f64::from(sample.speed));
        // Too large to represent means far above the ceiling
        let interval = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        (interval > floor).then(|| interval.min(ceiling))
    })
}

/// Tracks the playback position of the observed session.
#[derive(Clone)]
pub struct ProgressionCollector {
    inner: Arc<ProgressionInner>,
}

pub(crate) struct ProgressionInner {
    core: CollectorCore,
    value: watch::Sender<ProgressionSample>,
    handler: Mutex<Option<IntervalHandler>>,
    collect_event: AtomicBool,
    wake: Arc<Notify>,
}

impl ProgressionCollector {
    pub(crate) fn new(core: CollectorCore) -> Self {
        Self {
            inner: Arc::new(ProgressionInner {
                core,
                value: watch::channel(ProgressionSample::default()).0,
                handler: Mutex::new(None),
                collect_event: AtomicBool::new(true),
                wake: Arc::new(Notify::new()),
            }),
        }
    }

    pub(crate) fn as_facet(&self) -> Arc<dyn FacetCollector> {
        self.inner.clone()
    }

    pub fn start_collect(&self) -> CollectHandle {
        base::start_collect(&self.inner)
    }

    /// Replace the interval handler. `None` restores the default of polling
    /// at [`PlaybackConfig::default_poll_interval`] while playing.
    pub fn set_interval_handler(&self, handler: Option<IntervalHandler>) {
        *self.inner.handler.lock() = handler;
        self.inner.wake.notify_one();
    }

    /// Whether engine events (seeks, state changes) trigger a refresh.
    pub fn set_collect_event(&self, collect_event: bool) {
        self.inner
            .collect_event
            .store(collect_event, Ordering::SeqCst);
    }

    pub fn sample(&self) -> ProgressionSample {
        *self.inner.value.borrow()
    }

    pub fn position(&self) -> Duration {
        self.inner.value.borrow().position
    }

    pub fn buffered_position(&self) -> Duration {
        self.inner.value.borrow().buffered_position
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressionSample> {
        self.inner.value.subscribe()
    }

    /// Interval the polling loop would use for the current sample.
    pub fn current_interval(&self) -> Option<Duration> {
        self.inner.next_interval()
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }
}

impl ProgressionInner {
    fn next_interval(&self) -> Option<Duration> {
        let sample = *self.value.borrow();
        let handler = self.handler.lock().clone();
        let requested = match handler {
            Some(handler) => handler(&sample),
            None => sample
                .is_playing
                .then_some(self.core.ctx.config.default_poll_interval),
        };
        self.core.ctx.config.accept_interval(requested)
    }
}

impl CollectorTarget for ProgressionInner {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    fn publish(&self, player: Option<&Arc<dyn Player>>, source: RefreshSource) {
        let sample = match player {
            Some(player) => {
                let progress = player.progress();
                ProgressionSample {
                    position: progress.position,
                    buffered_position: progress.buffered_position,
                    duration: progress.duration,
                    speed: progress.speed,
                    is_playing: player.properties().is_playing,
                    is_event: source == RefreshSource::Event,
                }
            }
            None => ProgressionSample::default(),
        };
        self.value.send_replace(sample);
    }

    fn handles_event(&self, event: &PlayerEvent) -> bool {
        self.collect_event.load(Ordering::SeqCst)
            && matches!(
                event,
                PlayerEvent::PositionDiscontinuity { .. }
                    | PlayerEvent::MediaItemTransition { .. }
                    | PlayerEvent::TimelineChanged
                    | PlayerEvent::PlaybackStateChanged(_)
                    | PlayerEvent::IsPlayingChanged(_)
            )
    }

    fn handles_facet(&self, facet: Facet) -> bool {
        matches!(facet, Facet::Progress | Facet::Queue | Facet::PlayWhenReady)
    }

    fn on_started(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let scope = self.core.scope.clone();
        let wake = self.wake.clone();
        let collector = self.core.id();

        self.core.ctx.spawner.spawn(async move {
            loop {
                let interval = match weak.upgrade() {
                    Some(inner) => inner.next_interval(),
                    None => break,
                };
                let notified = wake.notified();

                match interval {
                    Some(interval) => {
                        core_async::select! {
                            _ = scope.cancelled() => break,
                            _ = notified => {}
                            _ = core_async::sleep(interval) => {
                                match weak.upgrade() {
                                    Some(inner) => base::refresh(&*inner, RefreshSource::Poll),
                                    None => break,
                                }
                            }
                        }
                    }
                    None => {
                        core_async::select! {
                            _ = scope.cancelled() => break,
                            _ = notified => {}
                        }
                    }
                }
            }
            trace!(collector, "Progression polling stopped");
        });
    }

    fn on_refreshed(&self, source: RefreshSource) {
        if source != RefreshSource::Poll {
            self.wake.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(duration_secs: u64, speed: f32) -> ProgressionSample {
        ProgressionSample {
            duration: Some(Duration::from_secs(duration_secs)),
            speed,
            is_playing: true,
            ..Default::default()
        }
    }

    #[test]
    fn seekbar_interval_divides_duration_by_width() {
        let handler = seekbar_interval_handler(400, &PlaybackConfig::default());
        assert_eq!(handler(&sample(200, 1.0)), Some(Duration::from_millis(500)));
        assert_eq!(handler(&sample(200, 2.0)), Some(Duration::from_millis(250)));
    }

    #[test]
    fn seekbar_interval_is_capped() {
        let handler = seekbar_interval_handler(200, &PlaybackConfig::default());
        assert_eq!(handler(&sample(1000, 1.0)), Some(Duration::from_secs(1)));
    }

    #[test]
    fn seekbar_interval_below_floor_disables_polling() {
        let handler = seekbar_interval_handler(200, &PlaybackConfig::default());
        assert_eq!(handler(&sample(10, 1.0)), None);
        assert_eq!(handler(&sample(20, 1.0)), None);
    }

    #[test]
    fn seekbar_interval_survives_vanishing_speed() {
        let handler = seekbar_interval_handler(400, &PlaybackConfig::default());
        assert_eq!(handler(&sample(200, 1e-30)), Some(Duration::from_secs(1)));
        assert_eq!(handler(&sample(200, f32::MIN_POSITIVE)), Some(Duration::from_secs(1)));
        assert_eq!(handler(&sample(200, f32::INFINITY)), None);
    }

    #[test]
    fn seekbar_interval_needs_duration_speed_and_width() {
        let config = PlaybackConfig::default();
        let handler = seekbar_interval_handler(400, &config);
        assert_eq!(handler(&sample(200, 0.0)), None);
        assert_eq!(handler(&ProgressionSample::default()), None);
        assert_eq!(seekbar_interval_handler(0, &config)(&sample(200, 1.0)), None);
    }
}
