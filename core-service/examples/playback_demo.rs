//! Drives a `PlaybackService` through a full host lifecycle against the
//! in-memory engine and prints what the collectors observe.
//!
//! Run with `RUST_LOG=debug` for fan-out detail.

use bridge_traits::Player;
use core_playback::seekbar_interval_handler;
use core_runtime::config::CoreConfig;
use core_runtime::logging::init_logging;
use core_service::{LocalPlayer, LocalSession, MediaItem, PlaybackService, ServiceEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CoreConfig::builder().session_id("FLAMM").build()?;
    init_logging(config.logging_config())?;

    let service = PlaybackService::builder(config).build()?;
    service.on_event(ServiceEvent::OnCreate);
    service.on_event(ServiceEvent::OnStartCommand);

    let player = Arc::new(LocalPlayer::new());
    player.set_queue(
        vec![
            MediaItem::new("overture", Some(Duration::from_secs(180))),
            MediaItem::new("aria", Some(Duration::from_secs(240))),
            MediaItem::new("finale", Some(Duration::from_secs(300))),
        ],
        0,
    )?;
    let session = Arc::new(LocalSession::new(
        service.config().session_id.clone(),
        player.clone() as Arc<dyn Player>,
    ));
    service.initialize_session(session);

    service.on_get_session();
    service.on_connect(Ok(()));
    service.on_post_connect(Ok(()));

    let controller = service.create_controller();
    let observer = controller.create_observer();
    let queue = observer.create_queue_collector();
    let properties = observer.create_properties_collector();
    let progression = observer.create_progression_collector();
    progression.set_interval_handler(Some(seekbar_interval_handler(
        360,
        service.presenter().config(),
    )));
    for primed in [
        queue.start_collect().wait().await,
        properties.start_collect().wait().await,
        progression.start_collect().wait().await,
    ] {
        anyhow::ensure!(primed, "collector failed to prime");
    }

    service.start_foreground();
    let played = controller.request_play().await;
    info!(success = played.is_success(), "play");
    played.wait().await;

    let skipped = controller.request_seek_next().await;
    info!(success = skipped.is_success(), "seek next");
    skipped.wait().await;

    let rejected = controller.request_seek_index(7, Duration::ZERO).await;
    info!(success = rejected.is_success(), "seek out of bounds");

    println!("queue:      {:?}", queue.queue());
    println!("properties: {:?}", properties.properties());
    println!("progress:   {:?}", progression.sample());
    println!("interval:   {:?}", progression.current_interval());

    // run the last item out
    controller
        .request_seek_index(2, Duration::from_secs(300))
        .await
        .wait()
        .await;
    player.tick()?;
    println!("at end:     {:?}", properties.properties().engine_state);

    service.stop(false);
    service.on_disconnected(Ok(()));
    service.destroy();
    println!("final state: {} / {}", service.service_state(), service.media_state());
    Ok(())
}
