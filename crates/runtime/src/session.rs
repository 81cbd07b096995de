//! Per-session hand-off state.
//!
//! Each UI session owns one slot holding the most recently generated file.
//! Transitions:
//!
//! - `Empty --generate--> Held(new)`
//! - `Held(old) --generate--> Held(new)`; `old` is kept or deleted per [`ReplacePolicy`]
//! - `Held(p) --delete ok--> Empty`
//! - `Held(p) --delete failed / not found--> Held(p)`
//! - `any --release--> Closed`; a generate that finishes after the session
//!   closed deletes its own file and fails
//!
//! Synthesis runs without the slot lock held, so sweeping and closing never
//! wait on the model.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use narrator_core::{
    DeleteOutcome, GenerateOutput, NarratorError, NarratorResult, OutputFileHandle, ReplacePolicy,
    SessionConfig, WorkflowResult,
};

use crate::metrics::WorkflowMetrics;
use crate::workflow::AudioWorkflow;

/// Hand-off slot contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HandoffSlot {
    #[default]
    Empty,
    Held(OutputFileHandle),
}

impl HandoffSlot {
    pub fn handle(&self) -> Option<&OutputFileHandle> {
        match self {
            HandoffSlot::Empty => None,
            HandoffSlot::Held(handle) => Some(handle),
        }
    }

    /// Held path as shown to the UI; empty when nothing is held.
    pub fn path_string(&self) -> String {
        self.handle()
            .map(OutputFileHandle::display_path)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, HandoffSlot::Empty)
    }
}

/// One UI session.
#[derive(Debug)]
pub struct AudioSession {
    id: Uuid,
    slot: Mutex<HandoffSlot>,
    closed: AtomicBool,
    last_activity: Mutex<Instant>,
}

impl AudioSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            slot: Mutex::new(HandoffSlot::Empty),
            closed: AtomicBool::new(false),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Snapshot of the slot.
    pub fn slot(&self) -> HandoffSlot {
        self.slot.lock().clone()
    }

    /// Update last activity.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Check if the session has been idle for at least `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.last_activity.lock().elapsed() >= ttl
    }

    /// Generate into this session and hold the new file.
    ///
    /// On failure the slot is left untouched.
    pub fn generate(
        &self,
        workflow: &AudioWorkflow,
        text: &str,
        base_name: &str,
    ) -> NarratorResult<GenerateOutput> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        self.touch();
        let handle = workflow.generate_handle(text, base_name)?;

        let mut slot = self.slot.lock();
        if self.is_closed() {
            drop(slot);
            let outcome = workflow.delete_outcome(&handle.display_path());
            debug!(
                session = %self.id,
                outcome = outcome.label(),
                "Session closed during generate"
            );
            return Err(self.closed_error());
        }
        let output = GenerateOutput::from_handle(&handle);

        let previous = std::mem::replace(&mut *slot, HandoffSlot::Held(handle));
        if let HandoffSlot::Held(old) = previous {
            match workflow.config().replace_policy {
                ReplacePolicy::Keep => {
                    debug!(
                        session = %self.id,
                        path = %old.path().display(),
                        "Dropped reference to previous audio"
                    );
                }
                ReplacePolicy::DeletePrevious => {
                    let outcome = workflow.delete_outcome(&old.display_path());
                    debug!(
                        session = %self.id,
                        outcome = outcome.label(),
                        "Replaced previous audio"
                    );
                }
            }
        }
        Ok(output)
    }

    fn closed_error(&self) -> NarratorError {
        NarratorError::NotFound(format!("session {} is closed", self.id))
    }

    /// Delete the held file; the slot empties only when removal succeeds.
    pub fn delete(&self, workflow: &AudioWorkflow) -> WorkflowResult {
        self.touch();
        let mut slot = self.slot.lock();
        let path = slot.path_string();
        let outcome = workflow.delete_outcome(&path);
        if outcome.is_deleted() {
            *slot = HandoffSlot::Empty;
        }
        outcome.into_result(&path)
    }

    /// End the session, optionally deleting whatever it still holds.
    pub fn release(&self, workflow: &AudioWorkflow, cleanup: bool) -> Option<DeleteOutcome> {
        let mut slot = self.slot.lock();
        self.closed.store(true, Ordering::Release);
        let held = std::mem::take(&mut *slot);
        drop(slot);
        let handle = held.handle()?;
        if cleanup {
            Some(workflow.delete_outcome(&handle.display_path()))
        } else {
            debug!(
                session = %self.id,
                path = %handle.path().display(),
                "Session ended holding audio"
            );
            None
        }
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Live UI sessions keyed by id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<AudioSession>>,
    // Serializes the capacity check with the insert.
    create_lock: Mutex<()>,
    config: SessionConfig,
    metrics: WorkflowMetrics,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            create_lock: Mutex::new(()),
            config,
            metrics: WorkflowMetrics,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.config.sweep_interval_secs)
    }

    /// Open a new session.
    pub fn create(&self) -> NarratorResult<Arc<AudioSession>> {
        let _guard = self.create_lock.lock();
        if self.sessions.len() >= self.config.max_sessions {
            warn!(max = self.config.max_sessions, "Session limit reached");
            return Err(NarratorError::ResourceExhausted(format!(
                "session limit of {} reached",
                self.config.max_sessions
            )));
        }
        let session = Arc::new(AudioSession::new());
        self.sessions.insert(session.id(), Arc::clone(&session));
        self.metrics.set_active_sessions(self.sessions.len());
        info!(session = %session.id(), "Session opened");
        Ok(session)
    }

    /// Look up a live session.
    pub fn get(&self, id: &Uuid) -> Option<Arc<AudioSession>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Close a session, applying the cleanup policy to its held file.
    pub fn remove(&self, id: &Uuid, workflow: &AudioWorkflow) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.release(workflow, self.config.cleanup_on_expiry);
                self.metrics.set_active_sessions(self.sessions.len());
                info!(session = %id, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Drop sessions idle for longer than the TTL; returns how many were removed.
    pub fn sweep_expired(&self, workflow: &AudioWorkflow) -> usize {
        let ttl = self.ttl();
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(ttl))
            .map(|entry| *entry.key())
            .collect();

        expired
            .iter()
            .filter(|id| self.remove(id, workflow))
            .count()
    }

    /// Close every session (server shutdown).
    pub fn drain(&self, workflow: &AudioWorkflow) -> usize {
        let ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter(|id| self.remove(id, workflow)).count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ToneSynthesizer;
    use narrator_core::{SpeechSynthesizer, SynthesisRequest, WorkflowConfig};
    use std::path::Path;
    use std::sync::mpsc;

    /// Tone synthesizer that reports when it starts and then stalls.
    struct SlowSynthesizer {
        inner: ToneSynthesizer,
        started: mpsc::Sender<()>,
        delay: Duration,
    }

    impl SpeechSynthesizer for SlowSynthesizer {
        fn synthesize(&self, request: &SynthesisRequest, destination: &Path) -> NarratorResult<()> {
            let _ = self.started.send(());
            std::thread::sleep(self.delay);
            self.inner.synthesize(request, destination)
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn workflow(dir: &Path, policy: ReplacePolicy) -> AudioWorkflow {
        let config = WorkflowConfig {
            output_dir: dir.join("output"),
            replace_policy: policy,
            ..WorkflowConfig::default()
        };
        AudioWorkflow::new(config, Arc::new(ToneSynthesizer::new(8000))).unwrap()
    }

    #[test]
    fn test_slot_starts_empty() {
        let session = AudioSession::new();
        assert!(session.slot().is_empty());
        assert_eq!(session.slot().path_string(), "");
    }

    #[test]
    fn test_generate_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let session = AudioSession::new();

        let out = session.generate(&workflow, "Hi", "demo").unwrap();
        assert_eq!(session.slot().path_string(), out.handoff_path);

        let result = session.delete(&workflow);
        assert_eq!(result, WorkflowResult::new("", "File deleted successfully."));
        assert!(session.slot().is_empty());
        assert!(!Path::new(&out.handoff_path).exists());
    }

    #[test]
    fn test_delete_when_file_already_gone_keeps_slot() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let session = AudioSession::new();

        let out = session.generate(&workflow, "Hi", "demo").unwrap();
        std::fs::remove_file(&out.handoff_path).unwrap();

        let result = session.delete(&workflow);
        assert_eq!(result.audio_path, out.handoff_path);
        assert_eq!(result.status_message, "File not found or already deleted.");
        assert_eq!(session.slot().path_string(), out.handoff_path);
    }

    #[test]
    fn test_keep_policy_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let session = AudioSession::new();

        let first = session.generate(&workflow, "One", "a").unwrap();
        let second = session.generate(&workflow, "Two", "b").unwrap();

        assert!(Path::new(&first.handoff_path).exists());
        assert_eq!(session.slot().path_string(), second.handoff_path);
    }

    #[test]
    fn test_delete_previous_policy_removes_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::DeletePrevious);
        let session = AudioSession::new();

        let first = session.generate(&workflow, "One", "a").unwrap();
        let second = session.generate(&workflow, "Two", "b").unwrap();

        assert!(!Path::new(&first.handoff_path).exists());
        assert!(Path::new(&second.handoff_path).exists());
    }

    #[test]
    fn test_failed_generate_keeps_slot() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let session = AudioSession::new();

        let first = session.generate(&workflow, "One", "a").unwrap();
        assert!(session.generate(&workflow, "  ", "b").is_err());
        assert_eq!(session.slot().path_string(), first.handoff_path);
    }

    #[test]
    fn test_store_create_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let store = SessionStore::new(SessionConfig::default());

        let session = store.create().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&session.id()).is_some());

        assert!(store.remove(&session.id(), &workflow));
        assert!(store.get(&session.id()).is_none());
        assert!(!store.remove(&session.id(), &workflow));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_limit() {
        let store = SessionStore::new(SessionConfig {
            max_sessions: 1,
            ..SessionConfig::default()
        });
        store.create().unwrap();
        assert!(matches!(
            store.create(),
            Err(NarratorError::ResourceExhausted(_))
        ));
    }

    #[test]
    fn test_sweep_with_cleanup_deletes_held_files() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let store = SessionStore::new(SessionConfig {
            ttl_secs: 0,
            cleanup_on_expiry: true,
            ..SessionConfig::default()
        });

        let session = store.create().unwrap();
        let out = session.generate(&workflow, "Hi", "").unwrap();

        assert_eq!(store.sweep_expired(&workflow), 1);
        assert!(store.is_empty());
        assert!(!Path::new(&out.handoff_path).exists());
    }

    #[test]
    fn test_drain_without_cleanup_orphans_files() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let store = SessionStore::new(SessionConfig::default());

        let session = store.create().unwrap();
        let out = session.generate(&workflow, "Hi", "").unwrap();
        store.create().unwrap();

        assert_eq!(store.drain(&workflow), 2);
        assert!(Path::new(&out.handoff_path).exists());
    }

    #[test]
    fn test_generate_after_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path(), ReplacePolicy::Keep);
        let session = AudioSession::new();

        assert!(session.release(&workflow, false).is_none());
        assert!(session.is_closed());
        assert!(matches!(
            session.generate(&workflow, "Hi", "demo"),
            Err(NarratorError::NotFound(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path().join("output")).unwrap().count(), 0);
    }

    #[test]
    fn test_sweep_does_not_wait_for_running_generate() {
        let dir = tempfile::tempdir().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let synthesizer = SlowSynthesizer {
            inner: ToneSynthesizer::new(8000),
            started: started_tx,
            delay: Duration::from_millis(400),
        };
        let config = WorkflowConfig {
            output_dir: dir.path().join("output"),
            ..WorkflowConfig::default()
        };
        let workflow = Arc::new(AudioWorkflow::new(config, Arc::new(synthesizer)).unwrap());
        let store = SessionStore::new(SessionConfig {
            ttl_secs: 0,
            ..SessionConfig::default()
        });
        let session = store.create().unwrap();

        let generating = {
            let workflow = Arc::clone(&workflow);
            std::thread::spawn(move || session.generate(&workflow, "Late words.", "late"))
        };
        started_rx.recv().unwrap();

        let start = Instant::now();
        assert_eq!(store.sweep_expired(&workflow), 1);
        assert!(start.elapsed() < Duration::from_millis(300));

        // The session closed mid-synthesis, so the new file must not survive.
        let result = generating.join().unwrap();
        assert!(matches!(result, Err(NarratorError::NotFound(_))));
        assert_eq!(std::fs::read_dir(dir.path().join("output")).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_create_respects_limit() {
        let store = Arc::new(SessionStore::new(SessionConfig {
            max_sessions: 4,
            ..SessionConfig::default()
        }));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create().is_ok())
            })
            .collect();
        let opened = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(opened, 4);
        assert_eq!(store.len(), 4);
    }
}
