use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};

use crate::config::ObserverConfig;
use crate::state::traits::StateObserver;
use crate::state::types::StateEvent;

struct Notification {
    event: Arc<StateEvent>,
    observers: Vec<Arc<dyn StateObserver>>,
}

/// Bounded fan-out of events to observers.
///
/// Callers enqueue and return; a dispatcher task delivers each event to every
/// active observer in its own task, at most `max_concurrency` at a time.
#[derive(Clone)]
pub(crate) struct ObserverDispatch {
    tx: mpsc::Sender<Notification>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl ObserverDispatch {
    pub(crate) fn start(cfg: &ObserverConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Notification>(cfg.queue_capacity.max(1));
        let sem = Arc::new(Semaphore::new(cfg.max_concurrency.max(1)));
        tokio::spawn(run_dispatcher(rx, sem));

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            drop_when_full: cfg.drop_when_full,
        }
    }

    pub(crate) fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) async fn notify(&self, event: Arc<StateEvent>, observers: Vec<Arc<dyn StateObserver>>) {
        if observers.is_empty() {
            return;
        }
        let notification = Notification { event, observers };
        if self.drop_when_full {
            if self.tx.try_send(notification).is_err() {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(dropped, "observer queue full, notification dropped");
            }
        } else if self.tx.send(notification).await.is_err() {
            // dispatcher stopped
        }
    }
}

async fn run_dispatcher(mut rx: mpsc::Receiver<Notification>, sem: Arc<Semaphore>) {
    while let Some(Notification { event, observers }) = rx.recv().await {
        for observer in observers {
            if !observer.is_active() {
                continue;
            }
            let Ok(permit) = sem.clone().acquire_owned().await else {
                return;
            };
            let event = event.clone();
            tokio::spawn(async move {
                let _permit = permit;
                deliver(observer.as_ref(), &event).await;
            });
        }
    }
    tracing::debug!("observer dispatcher stopped");
}

async fn deliver(observer: &dyn StateObserver, event: &StateEvent) {
    match AssertUnwindSafe(observer.on_state_change(event))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(
            observer = observer.id(),
            event_id = %event.id,
            error = %e,
            "observer failed"
        ),
        Err(_) => tracing::error!(
            observer = observer.id(),
            event_id = %event.id,
            "observer panicked"
        ),
    }
}
