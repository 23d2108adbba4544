//! Display synchronisation
//!
//! The store pushes an `Arc<FullState>` to every subscriber after each
//! committed mutation. Delivery is one-way and at-least-once; receivers
//! keep the newest revision and ignore anything older.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use parking_lot::RwLock;

use crate::FullState;

// ============ Sink Trait ============

/// Receiver of full-state snapshots
pub trait SnapshotSink: Send + Sync {
    fn push_snapshot(&self, state: Arc<FullState>);
}

struct CallbackSink<F>(F);

impl<F> SnapshotSink for CallbackSink<F>
where
    F: Fn(Arc<FullState>) + Send + Sync,
{
    fn push_snapshot(&self, state: Arc<FullState>) {
        (self.0)(state)
    }
}

/// Wrap a closure as a sink
pub fn callback_sink<F>(callback: F) -> Arc<dyn SnapshotSink>
where
    F: Fn(Arc<FullState>) + Send + Sync + 'static,
{
    Arc::new(CallbackSink(callback))
}

// ============ Subscribers ============

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registered sinks, notified in subscription order
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    sinks: Vec<(SubscriptionId, Arc<dyn SnapshotSink>)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Arc<dyn SnapshotSink>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.sinks.push((id, sink));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(sid, _)| *sid != id);
        self.sinks.len() != before
    }

    pub fn notify(&self, state: &Arc<FullState>) {
        for (_, sink) in &self.sinks {
            sink.push_snapshot(Arc::clone(state));
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.sinks.len())
            .finish()
    }
}

// ============ Channel Sink ============

/// Forwards snapshots to a display thread
pub struct ChannelSink {
    tx: Sender<Arc<FullState>>,
}

impl ChannelSink {
    /// Unbounded sink plus the receiving end for the display thread
    pub fn channel() -> (Self, Receiver<Arc<FullState>>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl SnapshotSink for ChannelSink {
    fn push_snapshot(&self, state: Arc<FullState>) {
        match self.tx.try_send(state) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!("Display channel full, snapshot dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Display channel disconnected");
            }
        }
    }
}

// ============ Display Replica ============

/// Read replica held by the display view
#[derive(Debug, Default)]
pub struct DisplayReplica {
    latest: RwLock<Option<Arc<FullState>>>,
}

impl DisplayReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `state` if it is newer than the current one. Returns whether
    /// it was applied.
    pub fn apply(&self, state: Arc<FullState>) -> bool {
        let mut latest = self.latest.write();
        match latest.as_ref() {
            Some(current) if current.revision >= state.revision => false,
            _ => {
                *latest = Some(state);
                true
            }
        }
    }

    /// Apply everything waiting on a channel. Returns the number of
    /// snapshots that advanced the replica.
    pub fn drain(&self, rx: &Receiver<Arc<FullState>>) -> usize {
        rx.try_iter().filter(|state| self.apply(Arc::clone(state))).count()
    }

    pub fn current(&self) -> Option<Arc<FullState>> {
        self.latest.read().clone()
    }

    pub fn revision(&self) -> Option<u64> {
        self.latest.read().as_ref().map(|s| s.revision)
    }
}

impl SnapshotSink for DisplayReplica {
    fn push_snapshot(&self, state: Arc<FullState>) {
        self.apply(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{CustomAssets, DisplaySettings, Statistics};
    use pd_draw::{DrawMode, SystemState};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn state(revision: u64) -> Arc<FullState> {
        Arc::new(FullState {
            revision,
            participants: Vec::new(),
            prizes: Vec::new(),
            current_prize_id: None,
            winners: Vec::new(),
            current_draw: None,
            draw_mode: DrawMode::One,
            custom_draw_count: 1,
            system_state: SystemState::Standby,
            statistics: Statistics::default(),
            custom_assets: CustomAssets::default(),
            display_settings: DisplaySettings::default(),
        })
    }

    #[test]
    fn test_replica_latest_wins() {
        let replica = DisplayReplica::new();
        assert!(replica.apply(state(2)));
        assert!(!replica.apply(state(1)));
        assert!(!replica.apply(state(2)));
        assert!(replica.apply(state(5)));
        assert_eq!(replica.revision(), Some(5));
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, rx) = ChannelSink::channel();
        sink.push_snapshot(state(1));
        sink.push_snapshot(state(3));
        sink.push_snapshot(state(2));

        let replica = DisplayReplica::new();
        assert_eq!(replica.drain(&rx), 2);
        assert_eq!(replica.revision(), Some(3));
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut subscribers = Subscribers::new();

        let counter = Arc::clone(&hits);
        let id = subscribers.subscribe(callback_sink(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        subscribers.notify(&state(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        subscribers.notify(&state(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(subscribers.is_empty());
    }
}
