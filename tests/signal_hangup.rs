//! SIGHUP drains gracefully when the process does not ignore it.
//!
//! Signals are process-wide, so this file holds a single test.

#![cfg(unix)]

use std::time::Duration;

use frame_server::lifecycle::signals::hangup_ignored;
use frame_server::lifecycle::{LifecycleState, Supervisor};

mod common;

#[tokio::test]
async fn test_hangup_drains_and_returns_ok() {
    if hangup_ignored() {
        // Started under nohup: SIGHUP is not watched.
        eprintln!("SIGHUP is ignored by this process, skipping");
        return;
    }

    let (server, addr) = common::start_server(Duration::from_millis(200)).await;
    let supervisor = Supervisor::new(server, common::test_options());
    let mut state = supervisor.state();
    let spin = tokio::spawn(supervisor.spin());

    state
        .wait_for(|s| *s == LifecycleState::Running)
        .await
        .unwrap();

    let client = common::client();
    let slow = tokio::spawn(async move { client.get(format!("http://{}/slow", addr)).send().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    common::send_signal(libc::SIGHUP);

    let result = tokio::time::timeout(Duration::from_secs(5), spin)
        .await
        .expect("SIGHUP must end the run")
        .unwrap();
    assert!(result.is_ok(), "unexpected result {result:?}");
    assert_eq!(*state.borrow(), LifecycleState::Stopped);

    let res = slow.await.unwrap().expect("In-flight request survives the drain");
    assert_eq!(res.status(), 200);
}
