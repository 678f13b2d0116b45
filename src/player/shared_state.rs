//! Hot, replaying playback state signal
//!
//! The latest state is cached in a `watch` channel so every subscriber sees
//! it immediately. The upstream engine listener runs only while someone is
//! subscribed: when the last subscription is dropped a teardown timer starts,
//! and the listener is aborted if nobody subscribes again within the grace
//! window. The cached state survives the teardown.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::PlaybackState;

type Connect = Box<dyn Fn(Arc<watch::Sender<PlaybackState>>) -> JoinHandle<()> + Send + Sync>;

/// Store `next` unless it equals the current state.
///
/// Returns whether subscribers were notified. A replaced `Playing` state has
/// its position signal finished.
pub(crate) fn publish(tx: &watch::Sender<PlaybackState>, next: PlaybackState) -> bool {
    tx.send_if_modified(move |current| {
        if *current == next {
            return false;
        }
        if let PlaybackState::Playing { position, .. } = current {
            position.finish();
        }
        *current = next;
        true
    })
}

#[derive(Default)]
struct Upstream {
    subscribers: usize,
    task: Option<JoinHandle<()>>,
    teardown: Option<JoinHandle<()>>,
}

struct Inner {
    tx: Arc<watch::Sender<PlaybackState>>,
    grace: Duration,
    connect: Connect,
    upstream: Mutex<Upstream>,
}

impl Inner {
    fn disconnect_if_unused(&self) {
        let mut upstream = self.upstream.lock();
        upstream.teardown = None;
        if upstream.subscribers == 0 {
            if let Some(task) = upstream.task.take() {
                task.abort();
                tracing::debug!("No playback state subscribers left, engine listener stopped");
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let upstream = self.upstream.get_mut();
        if let Some(task) = upstream.task.take() {
            task.abort();
        }
        if let Some(teardown) = upstream.teardown.take() {
            teardown.abort();
        }
    }
}

#[derive(Clone)]
pub struct SharedPlaybackState {
    inner: Arc<Inner>,
}

impl SharedPlaybackState {
    /// `connect` starts the upstream listener; it is called again whenever
    /// the signal is re-subscribed after a teardown.
    pub fn new<F>(grace: Duration, connect: F) -> Self
    where
        F: Fn(Arc<watch::Sender<PlaybackState>>) -> JoinHandle<()> + Send + Sync + 'static,
    {
        let (tx, _) = watch::channel(PlaybackState::Idle);
        Self {
            inner: Arc::new(Inner {
                tx: Arc::new(tx),
                grace,
                connect: Box::new(connect),
                upstream: Mutex::new(Upstream::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> PlaybackStateSubscription {
        let mut upstream = self.inner.upstream.lock();
        upstream.subscribers += 1;

        if let Some(teardown) = upstream.teardown.take() {
            teardown.abort();
        }

        let running = upstream.task.as_ref().is_some_and(|task| !task.is_finished());
        if !running {
            tracing::debug!("Connecting playback state to engine notifications");
            upstream.task = Some((self.inner.connect)(self.inner.tx.clone()));
        }
        drop(upstream);

        PlaybackStateSubscription {
            rx: self.inner.tx.subscribe(),
            replayed: false,
            _lease: Lease {
                inner: self.inner.clone(),
            },
        }
    }

    /// Last published state, without subscribing
    pub fn current(&self) -> PlaybackState {
        self.inner.tx.borrow().clone()
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.inner
            .upstream
            .lock()
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Keeps the upstream listener alive while held
struct Lease {
    inner: Arc<Inner>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut upstream = self.inner.upstream.lock();
        upstream.subscribers = upstream.subscribers.saturating_sub(1);
        if upstream.subscribers > 0 {
            return;
        }

        match Handle::try_current() {
            Ok(runtime) => {
                let inner: Weak<Inner> = Arc::downgrade(&self.inner);
                let grace = self.inner.grace;
                upstream.teardown = Some(runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    if let Some(inner) = inner.upgrade() {
                        inner.disconnect_if_unused();
                    }
                }));
            }
            Err(_) => {
                // Outside a runtime there is no timer to wait on
                drop(upstream);
                self.inner.disconnect_if_unused();
            }
        }
    }
}

/// One subscriber's view of the shared playback state
pub struct PlaybackStateSubscription {
    rx: watch::Receiver<PlaybackState>,
    replayed: bool,
    _lease: Lease,
}

impl PlaybackStateSubscription {
    /// The first call yields the latest state right away; later calls wait
    /// for the next distinct state.
    pub async fn next(&mut self) -> Option<PlaybackState> {
        if !self.replayed {
            self.replayed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakeEngine;
    use crate::model::Streamable;
    use crate::player::PositionStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast;

    fn track(title: &str) -> Streamable {
        Streamable {
            title: title.to_string(),
            detail: String::new(),
            image_url: String::new(),
            stream_uri: format!("http://stream/{}", title),
        }
    }

    fn playing(title: &str) -> PlaybackState {
        PlaybackState::Playing {
            streamable: track(title),
            total_duration_ms: 1_000,
            position: PositionStream::new(Arc::new(FakeEngine::new()), Duration::from_millis(250)),
        }
    }

    /// Shared state fed from a broadcast channel, counting connections
    fn forwarding(
        grace: Duration,
    ) -> (SharedPlaybackState, broadcast::Sender<PlaybackState>, Arc<AtomicUsize>) {
        let (source, _) = broadcast::channel::<PlaybackState>(16);
        let connects = Arc::new(AtomicUsize::new(0));
        let shared = {
            let source = source.clone();
            let connects = connects.clone();
            SharedPlaybackState::new(grace, move |tx| {
                connects.fetch_add(1, Ordering::SeqCst);
                let mut rx = source.subscribe();
                tokio::spawn(async move {
                    while let Ok(state) = rx.recv().await {
                        publish(&tx, state);
                    }
                })
            })
        };
        (shared, source, connects)
    }

    #[test]
    fn publish_suppresses_equal_states() {
        let (tx, _rx) = watch::channel(PlaybackState::Idle);

        assert!(!publish(&tx, PlaybackState::Idle));
        assert!(publish(&tx, PlaybackState::Loading { previous: None }));
        assert!(!publish(&tx, PlaybackState::Loading { previous: None }));
        assert!(publish(&tx, PlaybackState::Loading { previous: Some(track("a")) }));
    }

    #[test]
    fn playing_states_ignore_the_position_handle() {
        let (tx, _rx) = watch::channel(playing("a"));

        assert!(!publish(&tx, playing("a")));
        assert!(publish(&tx, playing("b")));
    }

    #[test]
    fn replacing_playing_finishes_its_position_signal() {
        let first = playing("a");
        let PlaybackState::Playing { position, .. } = &first else {
            unreachable!()
        };
        let position = position.clone();
        let (tx, _rx) = watch::channel(first);

        publish(&tx, PlaybackState::Paused { streamable: track("a") });

        assert!(position.is_finished());
    }

    #[tokio::test]
    async fn late_subscribers_receive_the_latest_state() {
        let (shared, source, _) = forwarding(Duration::from_millis(500));

        let mut early = shared.subscribe();
        assert_eq!(early.next().await, Some(PlaybackState::Idle));

        source.send(PlaybackState::Loading { previous: None }).unwrap();
        assert_eq!(early.next().await, Some(PlaybackState::Loading { previous: None }));

        let mut late = shared.subscribe();
        assert_eq!(late.next().await, Some(PlaybackState::Loading { previous: None }));

        source.send(PlaybackState::Paused { streamable: track("a") }).unwrap();
        let expected = Some(PlaybackState::Paused { streamable: track("a") });
        assert_eq!(early.next().await, expected);
        assert_eq!(late.next().await, expected);
        assert_eq!(shared.current(), PlaybackState::Paused { streamable: track("a") });
    }

    #[tokio::test]
    async fn duplicates_never_reach_subscribers() {
        let (shared, source, _) = forwarding(Duration::from_millis(500));
        let mut sub = shared.subscribe();
        assert_eq!(sub.next().await, Some(PlaybackState::Idle));

        source.send(PlaybackState::Idle).unwrap();
        source.send(PlaybackState::Idle).unwrap();
        source.send(PlaybackState::Ended { streamable: track("a") }).unwrap();

        assert_eq!(sub.next().await, Some(PlaybackState::Ended { streamable: track("a") }));
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribing_within_grace_keeps_the_listener() {
        let (shared, _source, connects) = forwarding(Duration::from_millis(500));

        let sub = shared.subscribe();
        drop(sub);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let _sub = shared.subscribe();
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(shared.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn listener_reconnects_after_grace_and_replays_cache() {
        let (shared, source, connects) = forwarding(Duration::from_millis(500));

        let mut sub = shared.subscribe();
        sub.next().await;
        source.send(PlaybackState::Error).unwrap();
        assert_eq!(sub.next().await, Some(PlaybackState::Error));
        drop(sub);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!shared.is_connected());

        let mut again = shared.subscribe();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(again.next().await, Some(PlaybackState::Error));

        source.send(PlaybackState::Idle).unwrap();
        assert_eq!(again.next().await, Some(PlaybackState::Idle));
    }
}
