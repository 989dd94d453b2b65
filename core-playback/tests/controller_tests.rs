//! Controller command, fan-out and disposal behaviour against the in-memory
//! engine and a mocked engine.

use async_trait::async_trait;
use bridge_desktop::{LocalPlayer, LocalSession, MediaItem};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    PlaybackProgress, PlaybackQueue, Player, PlayerId, PlayerListener, PlayerProperties,
    RepeatMode, SessionId, ShuffleMode,
};
use core_async::sync::CancellationToken;
use core_playback::{
    CompareAndSet, Facet, FieldWrite, PlaybackControlPresenter, PlaybackController,
    SessionManager,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

const SESSION: &str = "FLAMM";

struct Fixture {
    manager: Arc<SessionManager>,
    player: Arc<LocalPlayer>,
    presenter: PlaybackControlPresenter,
}

impl Fixture {
    fn new(items: &[&str]) -> Self {
        let manager = Arc::new(SessionManager::new(&CancellationToken::new(), None));
        let player = Arc::new(LocalPlayer::new());
        if !items.is_empty() {
            player
                .set_queue(
                    items
                        .iter()
                        .map(|id| MediaItem::new(*id, Some(Duration::from_secs(180))))
                        .collect(),
                    0,
                )
                .unwrap();
        }
        let session = Arc::new(LocalSession::new(SESSION, player.clone() as Arc<dyn Player>));
        assert!(manager.initialize_session(session));

        let presenter = PlaybackControlPresenter::builder(manager.clone())
            .build()
            .unwrap();

        Self {
            manager,
            player,
            presenter,
        }
    }

    fn controller(&self) -> PlaybackController {
        self.presenter.create_controller(SessionId::new(SESSION))
    }
}

#[tokio::test]
async fn seek_index_round_trip() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();

    let result = controller
        .request_seek_index(2, Duration::from_secs(5))
        .await;
    assert!(result.success);
    assert_eq!(controller.get_queue().current_index(), Some(2));
    assert_eq!(controller.get_progress().position, Duration::from_secs(5));

    let result = controller.request_seek_index(7, Duration::ZERO).await;
    assert!(!result.success);
    assert!(result.fan_out.is_none());
    assert_eq!(controller.get_queue().current_index(), Some(2));
}

#[tokio::test]
async fn empty_queue_rejects_every_seek() {
    let fx = Fixture::new(&[]);
    let controller = fx.controller();

    assert_eq!(controller.get_queue().raw_current_index(), PlaybackQueue::UNSET_INDEX);
    for index in [0, 1, 5] {
        let result = controller.request_seek_index(index, Duration::ZERO).await;
        assert!(!result.success);
    }
    assert!(!controller.request_play().await.success);
}

#[tokio::test]
async fn seek_next_advances_index_and_keeps_items() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();
    let before = controller.get_queue();

    let result = controller.request_seek_next().await;
    assert!(result.success);
    assert!(result.wait().await);

    let after = controller.get_queue();
    assert_eq!(after.current_index(), Some(1));
    assert_eq!(after.items(), before.items());
}

#[tokio::test]
async fn seek_previous_from_start_of_second_item() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();
    controller.request_seek_index(1, Duration::ZERO).await;

    assert!(controller.request_seek_previous().await.success);
    assert_eq!(controller.get_queue().current_index(), Some(0));
}

#[tokio::test]
async fn play_refreshes_each_observer_once() {
    let fx = Fixture::new(&["a", "b"]);
    let controller = fx.controller();
    let first = controller.create_observer();
    let second = controller.create_observer();
    let first_props = first.create_properties_collector();
    let second_props = second.create_properties_collector();
    assert!(first_props.start_collect().wait().await);
    assert!(second_props.start_collect().wait().await);

    let result = controller.request_play().await;
    assert!(result.success);
    assert!(result.wait().await);

    for observer in [&first, &second] {
        assert_eq!(observer.refresh_count(Facet::PlayWhenReady), 1);
        assert_eq!(observer.refresh_count(Facet::Queue), 0);
    }
    assert!(first_props.properties().play_when_ready);
    assert!(second_props.properties().playing);
}

#[tokio::test]
async fn each_command_refreshes_its_facet() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();
    let observer = controller.create_observer();

    assert!(controller.request_seek_position(Duration::from_secs(10)).await.wait().await);
    assert_eq!(observer.refresh_count(Facet::Progress), 1);

    assert!(controller.request_seek_index(1, Duration::ZERO).await.wait().await);
    assert_eq!(observer.refresh_count(Facet::Queue), 1);

    assert!(controller.request_set_repeat_mode(RepeatMode::All).await.wait().await);
    assert_eq!(observer.refresh_count(Facet::RepeatMode), 1);

    assert!(controller.request_set_shuffle_mode(ShuffleMode::On).await.wait().await);
    assert_eq!(observer.refresh_count(Facet::ShuffleMode), 1);

    assert!(controller.request_set_play_when_ready(true).await.wait().await);
    assert!(controller.request_pause().await.wait().await);
    assert_eq!(observer.refresh_count(Facet::PlayWhenReady), 2);

    let properties = controller.get_properties();
    assert_eq!(properties.repeat_mode, RepeatMode::All);
    assert_eq!(properties.shuffle_mode, ShuffleMode::On);
    assert!(!properties.play_when_ready);
}

#[tokio::test]
async fn unknown_session_reports_failure_without_fan_out() {
    let fx = Fixture::new(&["a"]);
    let controller = fx.presenter.create_controller(SessionId::new("other"));
    let observer = controller.create_observer();

    let result = controller.request_play().await;
    assert!(!result.success);
    assert!(result.fan_out.is_none());
    assert_eq!(observer.refresh_count(Facet::PlayWhenReady), 0);
    assert!(!fx.player.properties().play_when_ready);
    assert!(controller.get_queue().is_empty());
}

#[tokio::test]
async fn dispose_cascades_and_blocks_commands() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();
    let observers = [controller.create_observer(), controller.create_observer()];
    let queue = observers[0].create_queue_collector();
    let progression = observers[1].create_progression_collector();
    assert!(queue.start_collect().wait().await);
    assert!(progression.start_collect().wait().await);
    assert_eq!(fx.player.listener_count(), 2);
    assert_eq!(fx.presenter.controller_count(), 1);

    controller.dispose();
    controller.dispose();

    assert!(controller.is_disposed());
    assert_eq!(controller.observer_count(), 0);
    assert!(observers.iter().all(|observer| observer.is_disposed()));
    assert!(observers.iter().all(|observer| observer.collector_count() == 0));
    assert!(queue.is_disposed());
    assert!(progression.is_disposed());
    assert_eq!(fx.player.listener_count(), 0);
    assert_eq!(fx.presenter.controller_count(), 0);

    let result = controller.request_seek_next().await;
    assert!(!result.success);
    assert!(result.fan_out.is_none());
    assert_eq!(fx.player.queue().current_index(), Some(0));

    let late = controller.create_observer();
    assert!(late.is_disposed());
    assert!(!late.create_queue_collector().start_collect().wait().await);
}

#[tokio::test]
async fn presenter_dispose_disposes_every_controller() {
    let fx = Fixture::new(&["a"]);
    let first = fx.controller();
    let second = fx.controller();
    assert_eq!(fx.presenter.controller_count(), 2);

    fx.presenter.dispose();
    assert!(first.is_disposed());
    assert!(second.is_disposed());
    assert_eq!(fx.presenter.controller_count(), 0);
    assert!(fx.controller().is_disposed());
}

#[tokio::test]
async fn releasing_manager_leaves_controllers_without_player() {
    let fx = Fixture::new(&["a"]);
    let controller = fx.controller();

    fx.manager.release();
    assert!(!controller.request_play().await.success);
    assert_eq!(fx.player.release_count(), 1);
}

// ============================================================================
// Compare-and-set
// ============================================================================

#[tokio::test]
async fn compare_and_set_with_false_predicate_writes_nothing() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();

    let request = CompareAndSet::new(|snapshot| snapshot.queue.current_index() == Some(2))
        .write(FieldWrite::SeekToIndex {
            index: 1,
            start_position: Duration::ZERO,
        })
        .write(FieldWrite::RepeatMode(RepeatMode::One));

    let result = controller.request_compare_and_set(request).await;
    assert!(!result.success);
    assert_eq!(controller.get_queue().current_index(), Some(0));
    assert_eq!(controller.get_properties().repeat_mode, RepeatMode::Off);
}

#[tokio::test]
async fn compare_and_set_applies_writes_in_order() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let controller = fx.controller();
    let observer = controller.create_observer();

    let request = CompareAndSet::new(|snapshot| {
        snapshot.queue.current_index() == Some(0) && !snapshot.properties.play_when_ready
    })
    .write(FieldWrite::SeekToIndex {
        index: 2,
        start_position: Duration::ZERO,
    })
    .write(FieldWrite::SeekToPosition(Duration::from_secs(42)))
    .write(FieldWrite::PlayWhenReady(true));

    let result = controller.request_compare_and_set(request).await;
    assert!(result.success);
    assert!(result.wait().await);

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.queue.current_index(), Some(2));
    assert!(snapshot.properties.play_when_ready);
    for facet in Facet::ALL {
        assert_eq!(observer.refresh_count(facet), 1);
    }
}

#[tokio::test]
async fn compare_and_set_stops_at_failing_write() {
    let fx = Fixture::new(&["a", "b"]);
    let controller = fx.controller();

    let request = CompareAndSet::unconditional()
        .write(FieldWrite::ShuffleMode(ShuffleMode::On))
        .write(FieldWrite::SeekToIndex {
            index: 9,
            start_position: Duration::ZERO,
        })
        .write(FieldWrite::RepeatMode(RepeatMode::All));

    let result = controller.request_compare_and_set(request).await;
    assert!(!result.success);
    let properties = controller.get_properties();
    assert_eq!(properties.shuffle_mode, ShuffleMode::On);
    assert_eq!(properties.repeat_mode, RepeatMode::Off);
}

#[tokio::test]
async fn concurrent_compare_and_set_requests_do_not_interleave() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let first = fx.controller();
    let second = fx.controller();

    // Both predicates require index 0; whichever runs second must observe
    // the other's write and fail.
    let make = |target: usize| {
        CompareAndSet::new(|snapshot| snapshot.queue.current_index() == Some(0)).write(
            FieldWrite::SeekToIndex {
                index: target,
                start_position: Duration::ZERO,
            },
        )
    };

    let (a, b) = tokio::join!(
        first.request_compare_and_set(make(1)),
        second.request_compare_and_set(make(2))
    );
    assert!(a.success ^ b.success);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn commands_are_published_on_event_bus() {
    let bus = EventBus::new(32);
    let mut rx = bus.subscribe();
    let fx = Fixture::new(&["a"]);
    let presenter = PlaybackControlPresenter::builder(fx.manager.clone())
        .event_bus(bus)
        .build()
        .unwrap();
    let controller = presenter.create_controller(SessionId::new(SESSION));

    controller.request_play().await;
    controller.request_seek_index(4, Duration::ZERO).await;
    controller.dispose();

    let mut events = Vec::new();
    while let Ok(CoreEvent::Playback(event)) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events[0], PlaybackEvent::ControllerCreated { .. }));
    assert!(matches!(
        &events[1],
        PlaybackEvent::CommandCompleted { command, success: true, .. } if command == "play"
    ));
    assert!(matches!(
        &events[2],
        PlaybackEvent::CommandCompleted { command, success: false, .. } if command == "seek_index"
    ));
    assert!(matches!(events[3], PlaybackEvent::ControllerDisposed { observers: 0, .. }));
}

// ============================================================================
// Mocked engine
// ============================================================================

mock! {
    Engine {}

    #[async_trait]
    impl Player for Engine {
        fn id(&self) -> PlayerId;
        async fn play(&self) -> BridgeResult<()>;
        async fn pause(&self) -> BridgeResult<()>;
        async fn seek_to_position(&self, position: Duration) -> BridgeResult<()>;
        async fn seek_to_index(&self, index: usize, start_position: Duration) -> BridgeResult<()>;
        async fn seek_to_next(&self) -> BridgeResult<()>;
        async fn seek_to_previous(&self) -> BridgeResult<()>;
        async fn set_play_when_ready(&self, play_when_ready: bool) -> BridgeResult<()>;
        async fn set_repeat_mode(&self, mode: RepeatMode) -> BridgeResult<()>;
        async fn set_shuffle_mode(&self, mode: ShuffleMode) -> BridgeResult<()>;
        async fn set_volume(&self, volume: f32) -> BridgeResult<()>;
        fn queue(&self) -> PlaybackQueue;
        fn progress(&self) -> PlaybackProgress;
        fn properties(&self) -> PlayerProperties;
        fn add_listener(&self, listener: Arc<dyn PlayerListener>) -> bool;
        fn remove_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool;
        fn release(&self);
        fn is_released(&self) -> bool;
    }
}

fn mocked(engine: MockEngine) -> (Arc<SessionManager>, PlaybackControlPresenter) {
    let manager = Arc::new(SessionManager::new(&CancellationToken::new(), None));
    let session = Arc::new(LocalSession::new(SESSION, Arc::new(engine) as Arc<dyn Player>));
    manager.initialize_session(session);
    let presenter = PlaybackControlPresenter::builder(manager.clone())
        .build()
        .unwrap();
    (manager, presenter)
}

#[tokio::test]
async fn engine_rejection_is_a_failed_result() {
    let mut engine = MockEngine::new();
    engine.expect_id().return_const(PlayerId::new());
    engine
        .expect_seek_to_next()
        .times(1)
        .returning(|| Err(BridgeError::Rejected("no next item".to_string())));

    let (_manager, presenter) = mocked(engine);
    let controller = presenter.create_controller(SessionId::new(SESSION));
    let observer = controller.create_observer();

    let result = controller.request_seek_next().await;
    assert!(!result.success);
    assert!(result.fan_out.is_none());
    assert_eq!(observer.refresh_count(Facet::Queue), 0);
}

#[tokio::test]
async fn engine_is_called_once_per_command() {
    let mut engine = MockEngine::new();
    engine.expect_id().return_const(PlayerId::new());
    engine
        .expect_seek_to_index()
        .withf(|index, start| *index == 3 && *start == Duration::from_secs(1))
        .times(1)
        .returning(|_, _| Ok(()));
    engine.expect_set_volume().never();

    let (_manager, presenter) = mocked(engine);
    let controller = presenter.create_controller(SessionId::new(SESSION));

    let result = controller
        .request_seek_index(3, Duration::from_secs(1))
        .await;
    assert!(result.success);
    assert!(result.wait().await);
}
