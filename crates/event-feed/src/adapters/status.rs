use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::model::FeedUpdate;
use crate::ports::StatusPort;

#[derive(Default)]
pub struct NoopStatusPort;

impl StatusPort for NoopStatusPort {
    fn publish(&self, _update: FeedUpdate) {}
}

/// Fans feed updates out to every subscriber. The presentation layer
/// subscribes and drains its receiver on its own task, which is where UI
/// changes are applied.
pub struct BroadcastStatusPort {
    sender: broadcast::Sender<FeedUpdate>,
}

impl BroadcastStatusPort {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.sender.subscribe()
    }
}

impl StatusPort for BroadcastStatusPort {
    fn publish(&self, update: FeedUpdate) {
        if let Err(err) = self.sender.send(update) {
            debug!(update = ?err.0, "no feed subscribers; update discarded");
        }
    }
}

/// Forwards a broadcast subscription into an mpsc receiver so callers can
/// await updates without handling lag semantics.
///
/// The forwarding task is spawned on the current runtime, so this must be
/// called from within one. Use [`to_mpsc_on`] to pick the runtime explicitly.
pub fn to_mpsc(port: &BroadcastStatusPort, capacity: usize) -> mpsc::Receiver<FeedUpdate> {
    to_mpsc_on(&Handle::current(), port, capacity)
}

pub fn to_mpsc_on(
    handle: &Handle,
    port: &BroadcastStatusPort,
    capacity: usize,
) -> mpsc::Receiver<FeedUpdate> {
    let mut rx = port.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    handle.spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    if tx.send(update).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RefreshStatus;
    use cfapps_core_types::AppGuid;

    #[tokio::test]
    async fn subscribers_receive_updates_in_order() {
        let port = BroadcastStatusPort::new(8);
        let mut rx = to_mpsc(&port, 8);
        port.publish(FeedUpdate::Status {
            subject: AppGuid::from("A1"),
            status: RefreshStatus::Fetching,
        });
        port.publish(FeedUpdate::EventsUpdated {
            subject: AppGuid::from("A1"),
            count: 2,
        });

        assert_eq!(
            rx.recv().await,
            Some(FeedUpdate::Status {
                subject: AppGuid::from("A1"),
                status: RefreshStatus::Fetching,
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(FeedUpdate::EventsUpdated {
                subject: AppGuid::from("A1"),
                count: 2,
            })
        );
    }

    #[test]
    fn forwarding_runs_on_an_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("runtime");
        let port = BroadcastStatusPort::new(4);
        let mut rx = to_mpsc_on(runtime.handle(), &port, 4);
        port.publish(FeedUpdate::EventsUpdated {
            subject: AppGuid::from("A1"),
            count: 1,
        });
        let received = runtime.block_on(rx.recv());
        assert_eq!(
            received,
            Some(FeedUpdate::EventsUpdated {
                subject: AppGuid::from("A1"),
                count: 1,
            })
        );
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let port = BroadcastStatusPort::new(1);
        port.publish(FeedUpdate::EventsUpdated {
            subject: AppGuid::from("A1"),
            count: 0,
        });
    }
}
