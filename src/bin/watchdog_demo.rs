//! Minimal demo program wiring `WatchdogClient` into a main loop: ping a
//! task, poll for shutdown, and clean up on exit.

use std::time::Duration;

use svc_watchdog_client::{MapConfigSource, WatchdogClient};

const TASK_NAME: &str = "mainLoop";

#[tokio::main]
async fn main() {
    env_logger::init();

    let client = WatchdogClient::new();
    client.initialize(&MapConfigSource::new());

    if let Err(e) = client.start().await {
        log::error!("failed to start watchdog client: {e}");
        return;
    }
    client.ping(TASK_NAME, 15);

    log::info!("running in base folder: {}", std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_default());

    main_loop(&client).await;

    client.close_timeout(TASK_NAME);
    client.stop().await;
}

/// Mirrors the reference program's loop shape: wait up to a second for a
/// shutdown signal, bail out early if the watchdog itself has detected a
/// timeout, and re-ping on a slow cadence rather than every tick.
async fn main_loop(client: &WatchdogClient) {
    let mut r: u64 = 0;

    loop {
        let shutdown_requested = client.wait_for_shutdown_event(Duration::from_secs(1)).await;
        if shutdown_requested || client.is_timed_out() {
            break;
        }

        if r % 10 == 0 {
            client.ping(TASK_NAME, 30);
        }

        r = (r + 1) % 99_999_999;
    }

    log::info!("exiting");
}
