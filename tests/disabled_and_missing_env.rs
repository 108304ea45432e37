//! Scenarios 4 and 5 from the watchdog client's scenario list: a fully
//! disabled client observably does nothing, and a client started with no
//! `WATCHDOG_PORT`/`WATCHDOG_SECRET`/`SHUTDOWN_EVENT` still tracks
//! ordinary tasks even though it never pings.

use std::time::Duration;

use svc_watchdog_client::{MapConfigSource, WatchdogClient};

#[tokio::test]
async fn disabled_client_is_observably_inert() {
    let client = WatchdogClient::new();
    client.initialize(&MapConfigSource::new().set("SvcWatchDogClient", "Enabled", "false"));
    client.start().await.expect("start succeeds while disabled");

    client.ping("task1", 1);
    {
        let _guard = client.timeout_detector("scoped", 1, false);
        assert!(client.task_list().is_empty());
    }

    tokio::time::sleep(Duration::from_millis(1_200)).await;

    assert!(client.task_list().is_empty());
    assert!(!client.is_timed_out());
    assert!(!client.is_udp_pinging_active());

    client.stop().await;
}

#[tokio::test]
async fn missing_env_vars_disable_only_the_heartbeat() {
    std::env::remove_var("WATCHDOG_PORT");
    std::env::remove_var("WATCHDOG_SECRET");
    std::env::remove_var("SHUTDOWN_EVENT");

    let client = WatchdogClient::new();
    client.initialize(&MapConfigSource::new());
    client.start().await.expect("start succeeds");

    client.ping("task1", 1);
    assert_eq!(client.task_list().len(), 1);
    assert!(!client.is_udp_pinging_active());

    tokio::time::sleep(Duration::from_millis(1_200)).await;

    assert!(client.is_timed_out());
    assert!(client.task_list().is_empty());

    client.stop().await;
}
