//! Tests for the replay scheduler

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use typelapse_core::event::{Event, EventLog};
use typelapse_core::playback::{ReplayEvent, ReplayScheduler, ReplayState};

/// Log with fixed inter-event gaps in milliseconds
fn log_with_gaps(gaps: &[u64]) -> EventLog {
    let mut log = EventLog::new();
    let mut now = 1000;
    log.append("x", now);
    for (i, gap) in gaps.iter().enumerate() {
        now += gap;
        log.append("x".repeat(i + 2), now);
    }
    log
}

/// Receive until the Finished marker, returning everything seen
async fn collect_until_finished(events: &mut UnboundedReceiver<ReplayEvent>) -> Vec<ReplayEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let finished = matches!(event, ReplayEvent::Finished);
        seen.push(event);
        if finished {
            break;
        }
    }
    seen
}

fn frame_indices(events: &[ReplayEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Frame { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_emits_every_frame_in_capture_order() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[100, 250, 80, 1200]), 1.0);
    assert_eq!(scheduler.state(), ReplayState::Playing);

    let seen = collect_until_finished(&mut events).await;
    assert_eq!(frame_indices(&seen), vec![0, 1, 2, 3, 4]);
    assert!(matches!(seen.last(), Some(ReplayEvent::Finished)));
    assert_eq!(scheduler.state(), ReplayState::Finished);
    assert_eq!(scheduler.cursor(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_first_frame_is_immediate() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[60_000]), 1.0);

    // No time has passed, yet the opening snapshot is already there.
    match events.try_recv() {
        Ok(ReplayEvent::Frame { index: 0, value }) => assert_eq!(value, "x"),
        other => panic!("expected immediate first frame, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_speed_scales_gaps() {
    let (mut scheduler, mut events) = ReplayScheduler::new();

    let began = Instant::now();
    scheduler.play(log_with_gaps(&[1000, 2000]), 1.0);
    collect_until_finished(&mut events).await;
    assert_eq!(began.elapsed(), Duration::from_millis(3000));

    // Replaying the retained log at double speed halves the total time.
    let began = Instant::now();
    scheduler.replay(2.0);
    collect_until_finished(&mut events).await;
    assert_eq!(began.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_speed_change_applies_to_future_gaps() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    let began = Instant::now();
    scheduler.play(log_with_gaps(&[2000, 2000, 2000]), 1.0);

    // Land inside the second gap, whose sleep is already scheduled at 1x.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    scheduler.set_speed(2.0);

    let seen = collect_until_finished(&mut events).await;
    assert_eq!(frame_indices(&seen), vec![0, 1, 2, 3]);

    // Gap one and the in-flight gap two run at 1x, gap three at 2x.
    assert_eq!(began.elapsed(), Duration::from_millis(5000));
}

#[tokio::test(start_paused = true)]
async fn test_speed_change_restarts_countdown_from_remainder() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[2000, 2000, 2000]), 1.0);

    // Land inside the second gap: one frame is behind the cursor and a
    // 4000ms tail is still unplayed.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    while events.try_recv().is_ok() {}

    scheduler.set_speed(2.0);
    assert_eq!(scheduler.remaining_estimate_secs(), 2.0);

    // The replacement countdown reports the unplayed remainder at the new
    // speed, not the full session span.
    tokio::time::sleep(Duration::from_millis(1)).await;
    let first = match events.try_recv() {
        Ok(ReplayEvent::TimeLeft { seconds }) => seconds,
        other => panic!("expected a countdown report, got {other:?}"),
    };
    assert_eq!(first, 2.0);

    // It then ticks down in steps of one scaled second.
    let seen = collect_until_finished(&mut events).await;
    let rest: Vec<f64> = seen
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::TimeLeft { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert_eq!(rest, vec![1.5, 1.0]);
    assert_eq!(frame_indices(&seen), vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_emissions() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[10_000, 10_000, 10_000]), 1.0);

    // Let the second frame land, then stop.
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    scheduler.stop();
    assert_eq!(scheduler.state(), ReplayState::Idle);
    assert_eq!(scheduler.cursor(), 0);

    // Whatever was emitted before the stop stays queued; nothing may be
    // added afterwards.
    while events.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(events.try_recv().is_err());

    // The log is retained, so the replay can start over.
    scheduler.replay(1.0);
    let seen = collect_until_finished(&mut events).await;
    assert_eq!(frame_indices(&seen), vec![0, 1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_log_is_ignored() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(EventLog::new(), 1.0);

    assert_eq!(scheduler.state(), ReplayState::Idle);
    assert!(scheduler.log().is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_single_event_log_finishes_immediately() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    let mut log = EventLog::new();
    log.append("only", 42);
    scheduler.play(log, 1.0);

    let seen = collect_until_finished(&mut events).await;
    assert_eq!(frame_indices(&seen), vec![0]);
    assert_eq!(scheduler.state(), ReplayState::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_backwards_timestamps_replay_without_delay() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    let log = EventLog::from_events(vec![
        Event::new("a", 5000),
        Event::new("ab", 2000),
        Event::new("abc", 2600),
    ]);

    let began = Instant::now();
    scheduler.play(log, 1.0);
    let seen = collect_until_finished(&mut events).await;

    // The negative gap clamps to zero; only the final 600ms gap is slept.
    assert_eq!(frame_indices(&seen), vec![0, 1, 2]);
    assert_eq!(began.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_running_out_never_cuts_the_sequence() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    // A backwards middle timestamp gives the advisory countdown a zero
    // span while the sequence still has a full gap left to play.
    let log = EventLog::from_events(vec![
        Event::new("a", 1000),
        Event::new("ab", 0),
        Event::new("abc", 1000),
    ]);
    scheduler.play(log, 1.0);

    let seen = collect_until_finished(&mut events).await;
    assert_eq!(frame_indices(&seen), vec![0, 1, 2]);
    assert_eq!(scheduler.state(), ReplayState::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_arrives_after_finished() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[50_000, 50_000]), 1.0);

    let seen = collect_until_finished(&mut events).await;
    assert!(matches!(seen.last(), Some(ReplayEvent::Finished)));

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(events.try_recv().is_err());

    // Stop after finish is a no-op.
    scheduler.stop();
    assert_eq!(scheduler.state(), ReplayState::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_requested_speed_is_clamped() {
    let (mut scheduler, _events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[100]), 99.0);
    assert_eq!(scheduler.speed(), 10.0);

    scheduler.set_speed(0.001);
    assert_eq!(scheduler.speed(), 0.1);

    scheduler.set_speed(f64::NAN);
    assert_eq!(scheduler.speed(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_take_log_returns_retained_log() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    let log = log_with_gaps(&[100, 100]);
    scheduler.play(log.clone(), 4.0);
    collect_until_finished(&mut events).await;

    let taken = scheduler.take_log();
    assert_eq!(taken, Some(log));
    assert_eq!(scheduler.state(), ReplayState::Idle);
    assert!(scheduler.log().is_none());

    // Nothing retained anymore, so replay has nothing to do.
    scheduler.replay(1.0);
    assert_eq!(scheduler.state(), ReplayState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_advisory_countdown_ticks_down() {
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log_with_gaps(&[4000]), 1.0);

    let seen = collect_until_finished(&mut events).await;
    let countdown: Vec<f64> = seen
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::TimeLeft { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();

    assert_eq!(countdown.first(), Some(&4.0));
    assert!(countdown.windows(2).all(|pair| pair[1] < pair[0]));
    assert!(countdown.last().unwrap() <= &1.0);
}
