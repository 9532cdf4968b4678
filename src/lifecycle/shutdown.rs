//! Level-triggered stop signal shared between a service and its controller.

use tokio::sync::watch;

/// One-way trigger that long-running loops can wait on.
///
/// Unlike an edge event, a trigger fired before anyone waits is still seen:
/// late subscribers return immediately.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create an untriggered coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the trigger.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Fire the trigger. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Wait on a receiver obtained from [`Shutdown::subscribe`].
    pub async fn triggered(rx: &mut watch::Receiver<bool>) {
        // The sender only goes away with its owner, which also means stop.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let mut rx = shutdown.subscribe();
        tokio::time::timeout(Duration::from_millis(100), Shutdown::triggered(&mut rx))
            .await
            .expect("trigger fired before subscribe must be observed");
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn waiter_wakes_on_trigger() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let waiter = tokio::spawn(async move { Shutdown::triggered(&mut rx).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
