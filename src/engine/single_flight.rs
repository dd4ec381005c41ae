//! Process-local reload de-duplication.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::engine::ReloadError;

pub(crate) type ReloadResult = Result<usize, ReloadError>;

/// Handle every caller of the same reload awaits.
pub(crate) type ReloadHandle = Shared<BoxFuture<'static, ReloadResult>>;

#[derive(Default)]
struct Slot {
    generation: u64,
    in_flight: Option<ReloadHandle>,
}

/// At most one reload in flight; late callers join the pending one.
///
/// The work runs on a spawned task so it finishes even when every awaiter is
/// dropped. The slot is cleared by a guard owned by that task.
#[derive(Default)]
pub(crate) struct SingleFlight {
    slot: Arc<Mutex<Slot>>,
}

impl SingleFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight reload, or start `work` if there is none.
    pub(crate) fn join_or_start<F>(&self, work: F) -> ReloadHandle
    where
        F: FnOnce() -> BoxFuture<'static, ReloadResult>,
    {
        let mut slot = lock(&self.slot);
        if let Some(handle) = &slot.in_flight {
            return handle.clone();
        }

        slot.generation = slot.generation.wrapping_add(1);
        let guard = ClearOnDrop {
            slot: Arc::clone(&self.slot),
            generation: slot.generation,
        };
        let fut = work();
        let task = tokio::spawn(async move {
            let _guard = guard;
            fut.await
        });

        let handle = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ReloadError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        slot.in_flight = Some(handle.clone());
        handle
    }

    /// The reload currently in flight, if any.
    pub(crate) fn current(&self) -> Option<ReloadHandle> {
        lock(&self.slot).in_flight.clone()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the slot when the reload task ends, however it ends.
struct ClearOnDrop {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
}

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.generation == self.generation {
            slot.in_flight = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    fn always() -> bool {
        true
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let flight = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let first = {
            let runs = Arc::clone(&runs);
            flight.join_or_start(move || {
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    let _ = gate.await;
                    Ok::<_, ReloadError>(7)
                }
                .boxed()
            })
        };
        let second = {
            let runs = Arc::clone(&runs);
            flight.join_or_start(move || {
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ReloadError>(0)
                }
                .boxed()
            })
        };

        release.send(()).unwrap();
        assert_eq!(first.await, Ok(7));
        assert_eq!(second.await, Ok(7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slot_cleared_after_failure() {
        let flight = SingleFlight::new();

        let failed = flight
            .join_or_start(|| {
                async { Err::<usize, _>(ReloadError::Store("down".to_string())) }.boxed()
            })
            .await;
        assert_eq!(failed, Err(ReloadError::Store("down".to_string())));
        assert!(flight.current().is_none());

        let ok = flight
            .join_or_start(|| async { Ok::<_, ReloadError>(2) }.boxed())
            .await;
        assert_eq!(ok, Ok(2));
    }

    #[tokio::test]
    async fn test_panic_surfaces_as_aborted_and_clears_slot() {
        let flight = SingleFlight::new();

        let result = flight
            .join_or_start(|| {
                async {
                    if always() {
                        panic!("reload blew up");
                    }
                    Ok::<_, ReloadError>(0)
                }
                .boxed()
            })
            .await;
        assert!(matches!(result, Err(ReloadError::Aborted(_))));
        assert!(flight.current().is_none());
    }

    #[tokio::test]
    async fn test_work_completes_when_awaiter_dropped() {
        let flight = SingleFlight::new();
        let done = Arc::new(AtomicUsize::new(0));

        let handle = {
            let done = Arc::clone(&done);
            flight.join_or_start(move || {
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ReloadError>(1)
                }
                .boxed()
            })
        };
        drop(handle);

        for _ in 0..100 {
            if flight.current().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(flight.current().is_none());
    }
}
