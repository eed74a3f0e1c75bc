//! Background eviction of expired entries

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::QueryCache;

/// Handle to a running sweep task.
///
/// The task stops when the handle is dropped, when [`Sweeper::stop`] is
/// called, or when the cache itself has been dropped.
#[derive(Debug)]
pub struct Sweeper {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Stops the task and waits for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Returns `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<P> QueryCache<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Spawns a task that calls [`QueryCache::sweep`] every `sweep_interval`.
    ///
    /// Must be called from within a tokio runtime. The task holds only a
    /// weak reference, so it never keeps the cache alive.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Sweeper {
        let period = self.config().sweep_interval.max(Duration::from_millis(1));
        let cache = Arc::downgrade(self);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        let removed = cache.sweep();
                        if removed > 0 {
                            debug!("query cache: swept {removed} expired entries");
                        }
                    }
                }
            }
        });

        Sweeper {
            cancel,
            handle: Some(handle),
        }
    }
}
