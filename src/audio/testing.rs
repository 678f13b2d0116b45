//! Recording engine for tests

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::{
    EngineEvents, EngineNotification, EnginePhase, EngineSnapshot, MediaEngine,
    NOTIFICATION_CAPACITY,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    Load(String),
    Play,
    Pause,
    Stop,
    SeekTo(u64),
}

/// Engine that records every command and lets tests push notifications
pub struct FakeEngine {
    commands: Mutex<Vec<EngineCommand>>,
    snapshot: Mutex<EngineSnapshot>,
    position_ms: AtomicU64,
    notifications: broadcast::Sender<EngineNotification>,
}

impl FakeEngine {
    pub fn new() -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            commands: Mutex::new(Vec::new()),
            snapshot: Mutex::new(EngineSnapshot::default()),
            position_ms: AtomicU64::new(0),
            notifications,
        }
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifications.receiver_count()
    }

    pub fn set_position(&self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::SeqCst);
    }

    /// Replace the snapshot and broadcast it with the given change mask
    pub fn emit(&self, events: EngineEvents, snapshot: EngineSnapshot) {
        *self.snapshot.lock() = snapshot.clone();
        let _ = self.notifications.send(EngineNotification {
            events,
            snapshot,
            error: None,
        });
    }

    pub fn emit_error(&self, message: &str) {
        let snapshot = EngineSnapshot {
            phase: EnginePhase::Idle,
            ..self.snapshot.lock().clone()
        };
        *self.snapshot.lock() = snapshot.clone();
        let _ = self.notifications.send(EngineNotification {
            events: EngineEvents::PLAYER_ERROR | EngineEvents::PLAYBACK_STATE_CHANGED,
            snapshot,
            error: Some(message.to_string()),
        });
    }

    fn record(&self, command: EngineCommand) {
        self.commands.lock().push(command);
    }
}

impl MediaEngine for FakeEngine {
    fn load(&self, uri: &str) {
        self.record(EngineCommand::Load(uri.to_string()));
        self.snapshot.lock().phase = EnginePhase::Buffering;
    }

    fn play(&self) {
        self.record(EngineCommand::Play);
        self.snapshot.lock().play_when_ready = true;
    }

    fn pause(&self) {
        self.record(EngineCommand::Pause);
        self.snapshot.lock().play_when_ready = false;
    }

    fn stop(&self) {
        self.record(EngineCommand::Stop);
        self.snapshot.lock().phase = EnginePhase::Idle;
    }

    fn seek_to(&self, position_ms: u64) {
        self.record(EngineCommand::SeekTo(position_ms));
        self.position_ms.store(position_ms, Ordering::SeqCst);
    }

    fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.lock().clone()
    }

    fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.notifications.subscribe()
    }
}

/// Snapshot helpers for the common engine phases
pub fn snapshot(phase: EnginePhase, play_when_ready: bool) -> EngineSnapshot {
    EngineSnapshot {
        phase,
        play_when_ready,
        duration_ms: Some(180_000),
        is_loading: phase == EnginePhase::Buffering,
    }
}
