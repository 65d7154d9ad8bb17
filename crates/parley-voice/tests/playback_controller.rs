//! Integration tests for `PlaybackController` job identity and cancellation.
//!
//! # What is tested
//!
//! - A job moves Requesting → Decoding → Playing → Finished
//! - A newer `play` supersedes an older one at every stage; stale audio is
//!   never rendered
//! - `stop` is silent, idempotent and always leaves `is_playing == false`,
//!   including while a payload is still being decoded
//! - Synthesis and decode failures end the job without audio
//! - The echo gate is closed exactly while audio is audible

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeOutput, FakeSynthesizer};
use parley_core::{JobId, JobState, PlaybackStatus};
use parley_voice::{EchoGate, PlaybackController};
use tokio::sync::watch;

// ── Helpers ────────────────────────────────────────────────────────

struct Rig {
    controller: PlaybackController,
    synth: Arc<FakeSynthesizer>,
    output: Arc<FakeOutput>,
    gate: EchoGate,
    status: watch::Receiver<PlaybackStatus>,
}

fn rig() -> Rig {
    let synth = FakeSynthesizer::new();
    let output = FakeOutput::new();
    let gate = EchoGate::new();
    let controller = PlaybackController::new(synth.clone(), output.clone(), gate.clone());
    let status = controller.subscribe();
    Rig {
        controller,
        synth,
        output,
        gate,
        status,
    }
}

/// Wait until `job` reaches `state`.
async fn reach(status: &mut watch::Receiver<PlaybackStatus>, job: JobId, state: JobState) {
    tokio::time::timeout(
        Duration::from_secs(30),
        status.wait_for(|s| s.job == Some(job) && s.state == Some(state)),
    )
    .await
    .unwrap_or_else(|_| panic!("{job} never reached {state:?}"))
    .unwrap();
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn job_plays_then_finishes_naturally() {
    let mut rig = rig();

    let job = rig.controller.play("  hello there  ");
    reach(&mut rig.status, job, JobState::Playing).await;

    assert!(rig.controller.is_playing());
    assert!(!rig.controller.is_processing());
    assert!(rig.gate.is_closed(), "gate must be closed while audible");
    assert_eq!(rig.synth.requests(), vec!["hello there"]);
    assert_eq!(rig.output.rendered(), vec!["hello there"]);

    assert!(rig.output.finish());
    reach(&mut rig.status, job, JobState::Finished).await;

    assert!(!rig.controller.is_playing());
    assert!(!rig.gate.is_closed());
}

#[tokio::test(start_paused = true)]
async fn job_is_processing_while_synthesis_is_in_flight() {
    let rig = rig();
    rig.synth.delay("slow", Duration::from_millis(500));

    let job = rig.controller.play("slow");
    let status = rig.controller.status();

    assert_eq!(status, PlaybackStatus::new(job, JobState::Requesting));
    assert!(rig.controller.is_processing());
    assert!(!rig.controller.is_playing());
}

#[tokio::test(start_paused = true)]
async fn stale_request_never_renders() {
    let mut rig = rig();
    // The first job's synthesis would finish last if it were not cancelled.
    rig.synth.delay("first", Duration::from_millis(300));
    rig.synth.delay("second", Duration::from_millis(100));

    let first = rig.controller.play("first");
    let second = rig.controller.play("second");
    assert!(second > first);

    reach(&mut rig.status, second, JobState::Playing).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.output.rendered(), vec!["second"]);
    assert_eq!(rig.controller.status().job, Some(second));
    assert!(rig.controller.status().has_ended(first));
}

#[tokio::test(start_paused = true)]
async fn stale_request_that_resolves_first_never_renders() {
    let mut rig = rig();
    rig.synth.delay("first", Duration::from_millis(50));
    rig.synth.delay("second", Duration::from_millis(400));

    rig.controller.play("first");
    let second = rig.controller.play("second");

    reach(&mut rig.status, second, JobState::Playing).await;

    assert_eq!(rig.output.rendered(), vec!["second"]);
}

#[tokio::test(start_paused = true)]
async fn play_while_playing_halts_previous_job() {
    let mut rig = rig();

    let first = rig.controller.play("first");
    reach(&mut rig.status, first, JobState::Playing).await;

    let second = rig.controller.play("second");
    assert_eq!(rig.output.halts(), 1);
    assert!(!rig.gate.is_closed(), "superseding a playing job opens the gate");

    reach(&mut rig.status, second, JobState::Playing).await;
    assert_eq!(rig.output.rendered(), vec!["first", "second"]);
    assert!(rig.gate.is_closed());

    assert!(rig.output.finish());
    reach(&mut rig.status, second, JobState::Finished).await;
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_silences_output() {
    let mut rig = rig();

    // Nothing to stop yet.
    rig.controller.stop();
    assert_eq!(rig.controller.status(), PlaybackStatus::default());
    assert_eq!(rig.output.halts(), 0);

    let job = rig.controller.play("hello");
    reach(&mut rig.status, job, JobState::Playing).await;

    rig.controller.stop();
    rig.controller.stop();
    rig.controller.stop();

    assert_eq!(rig.output.halts(), 1);
    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(job, JobState::Cancelled)
    );
    assert!(!rig.controller.is_playing());
    assert!(!rig.gate.is_closed());

    // A drained-buffer callback arriving after stop changes nothing.
    assert!(!rig.output.finish());
    assert_eq!(rig.controller.status().state, Some(JobState::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn stop_during_synthesis_prevents_render() {
    let rig = rig();
    rig.synth.delay("pending", Duration::from_millis(200));

    let job = rig.controller.play("pending");
    rig.controller.stop();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(rig.output.rendered().is_empty());
    assert_eq!(rig.output.halts(), 0, "nothing was audible, nothing to halt");
    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(job, JobState::Cancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn stop_during_decode_is_silent() {
    let mut rig = rig();
    let release = rig.output.hold_decode("almost there");

    let job = rig.controller.play("almost there");
    reach(&mut rig.status, job, JobState::Decoding).await;
    assert!(rig.controller.is_processing());

    rig.controller.stop();
    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(job, JobState::Cancelled)
    );
    assert!(!rig.controller.is_playing());

    // The decode finishes after the stop; its buffer must go nowhere.
    release.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(rig.output.rendered().is_empty());
    assert_eq!(rig.output.halts(), 0, "nothing was audible, nothing to halt");
    assert!(!rig.gate.is_closed());
    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(job, JobState::Cancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn decode_finishing_after_supersession_never_renders() {
    let mut rig = rig();
    let release = rig.output.hold_decode("first");

    let first = rig.controller.play("first");
    reach(&mut rig.status, first, JobState::Decoding).await;

    let second = rig.controller.play("second");
    reach(&mut rig.status, second, JobState::Playing).await;

    release.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.output.rendered(), vec!["second"]);
    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(second, JobState::Playing)
    );
    assert!(rig.controller.status().has_ended(first));
}

#[tokio::test(start_paused = true)]
async fn synthesis_failure_ends_job_without_audio() {
    let mut rig = rig();
    rig.synth.fail("broken");

    let job = rig.controller.play("broken");
    reach(&mut rig.status, job, JobState::Failed).await;

    assert!(rig.output.rendered().is_empty());
    assert!(!rig.controller.is_playing());
    assert!(!rig.controller.is_processing());
}

#[tokio::test(start_paused = true)]
async fn decode_failure_ends_job_without_audio() {
    let mut rig = rig();
    rig.output.fail_decoding();

    let job = rig.controller.play("garbled");
    reach(&mut rig.status, job, JobState::Failed).await;

    assert!(rig.output.rendered().is_empty());
    assert!(!rig.gate.is_closed());
}

#[tokio::test(start_paused = true)]
async fn blank_text_finishes_without_synthesis() {
    let rig = rig();

    let job = rig.controller.play("   ");

    assert_eq!(
        rig.controller.status(),
        PlaybackStatus::new(job, JobState::Finished)
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rig.synth.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn job_ids_increase_monotonically() {
    let rig = rig();
    let ids: Vec<JobId> = (0..5).map(|i| rig.controller.play(&format!("n{i}"))).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(rig.controller.status().job, ids.last().copied());
}
