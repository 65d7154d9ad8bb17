//! Playback job identity and lifecycle.

use serde::{Deserialize, Serialize};

/// Identity of one attempt to synthesize and render audio.
///
/// Identities are handed out from a monotonically increasing counter, so a
/// larger id is always a more recent job. Continuations compare the id they
/// captured at job creation with the current one before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle of a playback job.
///
/// ```text
///   Requesting → Decoding → Playing → Finished
///        │           │          │
///        └───────────┴──────────┴──→ Cancelled | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting on the speech synthesizer.
    Requesting,
    /// Turning the synthesized payload into a playable buffer.
    Decoding,
    /// Audible output in progress.
    Playing,
    /// Playback drained naturally.
    Finished,
    /// Superseded by a newer job or stopped explicitly.
    Cancelled,
    /// Synthesis, decode or output failed; nothing (more) is audible.
    Failed,
}

impl JobState {
    /// Whether the job may still produce audio.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Requesting | Self::Decoding | Self::Playing)
    }

    /// Requesting or decoding: work is in flight but nothing is audible yet.
    #[must_use]
    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Requesting | Self::Decoding)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

/// Observable snapshot of the playback controller.
///
/// `job` is the most recently issued job (if any) and `state` its lifecycle
/// state. A snapshot with no job means nothing was ever played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub job: Option<JobId>,
    pub state: Option<JobState>,
}

impl PlaybackStatus {
    #[must_use]
    pub const fn new(job: JobId, state: JobState) -> Self {
        Self {
            job: Some(job),
            state: Some(state),
        }
    }

    /// Audio is currently audible.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == Some(JobState::Playing)
    }

    /// Audio is being requested or decoded.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.state.is_some_and(JobState::is_processing)
    }

    /// Whether the given job has reached a terminal state, or has been
    /// superseded by a newer one.
    #[must_use]
    pub fn has_ended(&self, job: JobId) -> bool {
        match (self.job, self.state) {
            (Some(current), Some(state)) if current == job => state.is_terminal(),
            (Some(current), _) => current > job,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_states() {
        assert!(JobState::Requesting.is_live());
        assert!(JobState::Decoding.is_live());
        assert!(JobState::Playing.is_live());
        assert!(JobState::Finished.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn default_status_is_quiet() {
        let status = PlaybackStatus::default();
        assert!(!status.is_playing());
        assert!(!status.is_processing());
    }

    #[test]
    fn has_ended_tracks_supersession() {
        let first = JobId(1);
        let second = JobId(2);

        assert!(!PlaybackStatus::new(first, JobState::Decoding).has_ended(first));
        assert!(PlaybackStatus::new(first, JobState::Finished).has_ended(first));
        // A newer job means the old one is gone, whatever the newer one is doing.
        assert!(PlaybackStatus::new(second, JobState::Requesting).has_ended(first));
        assert!(!PlaybackStatus::new(first, JobState::Playing).has_ended(second));
    }
}
