//! Following a game's committed snapshots.

use futures_util::Stream;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::actor::GameHandle;
use super::errors::{InstanceError, InstanceResult};
use super::messages::GameUpdate;

/// Live feed of one game's snapshots.
///
/// Yields the snapshot current at subscription time first, then every
/// later one in commit order. A subscriber that falls too far behind
/// skips straight to the latest snapshot. Once the game is deleted the
/// feed ends with [`InstanceError::NotFound`].
pub struct Subscription {
    handle: GameHandle,
    receiver: broadcast::Receiver<Arc<GameUpdate>>,
    pending: Option<Arc<GameUpdate>>,
    last_version: Option<u64>,
    terminated: bool,
}

impl Subscription {
    pub(crate) fn new(
        handle: GameHandle,
        current: Arc<GameUpdate>,
        receiver: broadcast::Receiver<Arc<GameUpdate>>,
    ) -> Self {
        Self {
            handle,
            receiver,
            pending: Some(current),
            last_version: None,
            terminated: false,
        }
    }

    /// Wait for the next snapshot newer than the last one returned.
    pub async fn next(&mut self) -> InstanceResult<Arc<GameUpdate>> {
        if let Some(update) = self.pending.take() {
            return Ok(self.accept(update));
        }

        while !self.terminated {
            let update = match self.receiver.recv().await {
                Ok(update) => update,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "Game {}: subscriber lagged by {} updates, resyncing",
                        self.handle.code(),
                        skipped
                    );
                    match self.handle.snapshot().await {
                        Ok(update) => update,
                        Err(_) => {
                            self.terminated = true;
                            break;
                        }
                    }
                }
                Err(RecvError::Closed) => {
                    self.terminated = true;
                    break;
                }
            };

            if self.is_stale(&update) {
                continue;
            }
            return Ok(self.accept(update));
        }

        Err(InstanceError::NotFound(self.handle.code().clone()))
    }

    /// Version of the last snapshot returned by [`next`](Self::next)
    pub fn last_version(&self) -> Option<u64> {
        self.last_version
    }

    /// Turn the subscription into a stream that ends after the
    /// `NotFound` item.
    pub fn into_stream(self) -> impl Stream<Item = InstanceResult<Arc<GameUpdate>>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut subscription = state?;
            match subscription.next().await {
                Ok(update) => Some((Ok(update), Some(subscription))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    fn is_stale(&self, update: &GameUpdate) -> bool {
        self.last_version
            .is_some_and(|version| update.version <= version)
    }

    fn accept(&mut self, update: Arc<GameUpdate>) -> Arc<GameUpdate> {
        self.last_version = Some(update.version);
        update
    }
}
