//! Background registration against an HTTP directory service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use url::Url;

use frame_server::lifecycle::{LifecycleError, LifecycleOptions, LifecycleState, Supervisor};
use frame_server::registry::{HttpRegistry, RegistryError, RegistryInfo};

mod common;

fn registry_for(addr: std::net::SocketAddr) -> Arc<HttpRegistry> {
    let endpoint = Url::parse(&format!("http://{}/register", addr)).unwrap();
    Arc::new(HttpRegistry::new(endpoint, Duration::from_secs(2)).unwrap())
}

#[tokio::test]
async fn test_rejected_registration_forces_stop() {
    let backend = common::start_programmable_backend(|_body| async {
        (503, "unavailable".to_string())
    })
    .await;
    let (server, addr) = common::start_server(Duration::from_millis(10)).await;

    let options = LifecycleOptions {
        registry: registry_for(backend),
        registry_info: RegistryInfo {
            service_name: "frame-test".into(),
            addr: addr.to_string(),
            ..RegistryInfo::default()
        },
        ..common::test_options()
    };
    let supervisor = Supervisor::new(server, options);
    let state = supervisor.state();

    let result = tokio::time::timeout(Duration::from_secs(5), supervisor.spin())
        .await
        .expect("Registration failure must end the run");

    match result {
        Err(LifecycleError::RegistrationFailure(RegistryError::Rejected { status })) => {
            assert_eq!(status, 503)
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(*state.borrow(), LifecycleState::ForceStopped);
}

#[tokio::test]
async fn test_registration_posts_instance_once() {
    let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let backend = {
        let received = received.clone();
        common::start_programmable_backend(move |body| {
            received.lock().unwrap().push(body);
            async { (200, "{}".to_string()) }
        })
        .await
    };
    let (server, addr) = common::start_server(Duration::from_millis(10)).await;

    let options = LifecycleOptions {
        registry: registry_for(backend),
        registry_info: RegistryInfo {
            service_name: "frame-test".into(),
            addr: addr.to_string(),
            weight: 7,
            ..RegistryInfo::default()
        },
        ..common::test_options()
    };
    let (trigger, fired) = oneshot::channel::<()>();
    let mut supervisor = Supervisor::new(server, options);
    supervisor.set_signal_waiter(|mut fatal| async move {
        tokio::select! {
            Some(err) = fatal.recv() => Err(err),
            _ = fired => Ok(()),
        }
    });
    let spin = tokio::spawn(supervisor.spin());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while received.lock().unwrap().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "No registration arrived");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1, "Registration is single-attempt");
    let info: RegistryInfo = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(info.service_name, "frame-test");
    assert_eq!(info.addr, addr.to_string());
    assert_eq!(info.weight, 7);

    trigger.send(()).unwrap();
    spin.await.unwrap().expect("Successful registration leaves the run healthy");
}
