use std::cell::RefCell;
use std::rc::Rc;

use vizij_sequencer_core::{
    events::{ANIMATION_COMPLETED, SEQUENCE_COMPLETED, SEQUENCE_PAUSED, SEQUENCE_RESUMING},
    HeadlessRenderer, ManualClock, Properties, RenderCall, Sequence, SequenceBuilder,
    SequenceState, SequencerError, StepConfig, StepState,
};

fn harness() -> (ManualClock, Sequence<HeadlessRenderer>) {
    let clock = ManualClock::new();
    let renderer = HeadlessRenderer::new()
        .with_target("a", Properties::new().with("left", 0))
        .with_target("b", Properties::new().with("top", 0));
    let seq = SequenceBuilder::new()
        .clock(clock.clone())
        .build(renderer)
        .expect("sequence should build");
    (clock, seq)
}

fn counter(seq: &mut Sequence<HeadlessRenderer>, name: &str) -> Rc<RefCell<usize>> {
    let hits = Rc::new(RefCell::new(0));
    let sink = hits.clone();
    seq.on(name, move |_| *sink.borrow_mut() += 1);
    hits
}

fn run_for(clock: &ManualClock, seq: &mut Sequence<HeadlessRenderer>, ms: f64) -> usize {
    clock.advance(ms);
    seq.tick()
}

#[test]
fn pause_cancels_every_timer() {
    let (clock, mut seq) = harness();
    seq.add("a", Properties::new().with("left", 10), StepConfig::new())
        .expect("add");
    seq.add("b", Properties::new().with("top", 10), StepConfig::new().when(300.0))
        .expect("add");
    let completions = counter(&mut seq, ANIMATION_COMPLETED);
    let done = counter(&mut seq, SEQUENCE_COMPLETED);
    let paused = counter(&mut seq, SEQUENCE_PAUSED);

    seq.start();
    run_for(&clock, &mut seq, 100.0);
    seq.pause();
    assert_eq!(seq.get_state(), SequenceState::Paused);
    assert_eq!(seq.pending_timers(), 0);
    assert_eq!(*paused.borrow(), 1);

    let states: Vec<StepState> = seq.steps().iter().map(|s| s.state()).collect();
    assert_eq!(states, vec![StepState::Paused, StepState::OnStackReset]);
    assert!(seq.renderer().is_frozen("a"));

    for _ in 0..10 {
        assert_eq!(run_for(&clock, &mut seq, 1_000.0), 0);
    }
    assert_eq!(*completions.borrow(), 0);
    assert_eq!(*done.borrow(), 0);
}

#[test]
fn resume_completes_after_the_unplayed_remainder() {
    let (clock, mut seq) = harness();
    let id = seq
        .add("a", Properties::new().with("left", 10), StepConfig::new().duration(500.0))
        .expect("add");
    let completions = counter(&mut seq, ANIMATION_COMPLETED);
    let resuming = counter(&mut seq, SEQUENCE_RESUMING);

    seq.start();
    run_for(&clock, &mut seq, 200.0);
    seq.pause();
    assert_eq!(seq.step(id).map(|s| s.played_ms()), Some(200.0));

    clock.advance(1_000.0);
    seq.resume();
    assert_eq!(seq.get_state(), SequenceState::Resuming);
    assert_eq!(*resuming.borrow(), 1);
    assert!(!seq.renderer().is_frozen("a"));

    run_for(&clock, &mut seq, 299.0);
    assert_eq!(*completions.borrow(), 0);
    run_for(&clock, &mut seq, 1.0);
    assert_eq!(*completions.borrow(), 1);
    assert_eq!(seq.remaining(), 0);
}

#[test]
fn repeated_pause_resume_accumulates_played_time() {
    let (clock, mut seq) = harness();
    seq.add("a", Properties::new().with("left", 10), StepConfig::new().duration(600.0))
        .expect("add");
    let completions = counter(&mut seq, ANIMATION_COMPLETED);

    seq.start();
    run_for(&clock, &mut seq, 100.0);
    seq.pause();
    clock.advance(50.0);
    seq.resume();
    run_for(&clock, &mut seq, 200.0);
    seq.pause();
    clock.advance(50.0);
    seq.resume();
    // 300 of 600 played
    run_for(&clock, &mut seq, 299.0);
    assert_eq!(*completions.borrow(), 0);
    run_for(&clock, &mut seq, 1.0);
    assert_eq!(*completions.borrow(), 1);
}

#[test]
fn held_steps_reschedule_relative_to_pause_point() {
    let (clock, mut seq) = harness();
    seq.add("a", Properties::new().with("left", 10), StepConfig::new().duration(1_000.0))
        .expect("add");
    let b = seq
        .add(
            "b",
            Properties::new().with("top", 10),
            StepConfig::new().when(600.0).duration(100.0),
        )
        .expect("add");

    seq.start();
    run_for(&clock, &mut seq, 250.0);
    seq.pause();
    assert_eq!(seq.paused_at(), Some(250.0));
    assert_eq!(seq.step(b).map(|s| s.state()), Some(StepState::OnStackReset));

    clock.advance(5_000.0);
    seq.resume();
    assert_eq!(seq.step(b).map(|s| s.state()), Some(StepState::OnStack));

    run_for(&clock, &mut seq, 349.0);
    assert_eq!(seq.step(b).map(|s| s.state()), Some(StepState::OnStack));
    run_for(&clock, &mut seq, 1.0);
    assert_eq!(seq.step(b).map(|s| s.state()), Some(StepState::Playing));
}

#[test]
fn resume_recaptures_start_params() {
    let (clock, mut seq) = harness();
    let id = seq
        .add("a", Properties::new().with("left", 80), StepConfig::new())
        .expect("add");
    seq.start();
    run_for(&clock, &mut seq, 100.0);
    seq.pause();
    seq.resume();
    let step = seq.step(id).expect("step");
    assert_eq!(
        step.start_params()
            .and_then(|p| p.get("left"))
            .and_then(|v| v.as_number()),
        Some(80.0)
    );
    let kinds: Vec<&str> = seq.renderer().calls().iter().map(RenderCall::kind).collect();
    assert_eq!(kinds, vec!["transition", "freeze", "unfreeze"]);
}

#[test]
fn pause_and_resume_no_ops() {
    let (_clock, mut seq) = harness();
    seq.add("a", Properties::new(), StepConfig::new()).expect("add");

    let err = seq.try_pause().unwrap_err();
    assert!(matches!(err, SequencerError::NoOp { .. }));
    let err = seq.try_resume().unwrap_err();
    assert!(matches!(err, SequencerError::NoOp { .. }));

    seq.start();
    assert!(matches!(
        seq.try_resume().unwrap_err(),
        SequencerError::NoOp { .. }
    ));
    seq.try_pause().expect("first pause");
    let err = seq.try_pause().unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(seq.get_state(), SequenceState::Paused);
}

#[test]
fn start_while_paused_resumes() {
    let (clock, mut seq) = harness();
    seq.add("a", Properties::new(), StepConfig::new().duration(400.0))
        .expect("add");
    let completions = counter(&mut seq, ANIMATION_COMPLETED);
    seq.start();
    run_for(&clock, &mut seq, 100.0);
    seq.pause();
    seq.start();
    assert_eq!(seq.get_state(), SequenceState::Resuming);
    run_for(&clock, &mut seq, 300.0);
    assert_eq!(*completions.borrow(), 1);
}

#[test]
fn pad_timer_survives_pause() {
    let (clock, mut seq) = harness();
    seq.add("a", Properties::new(), StepConfig::new().duration(100.0))
        .expect("add");
    seq.wait(400.0);
    let done = counter(&mut seq, SEQUENCE_COMPLETED);

    seq.start();
    run_for(&clock, &mut seq, 100.0);
    run_for(&clock, &mut seq, 150.0);
    seq.pause();
    assert_eq!(seq.pending_timers(), 0);
    run_for(&clock, &mut seq, 10_000.0);
    assert_eq!(*done.borrow(), 0);

    seq.resume();
    run_for(&clock, &mut seq, 249.0);
    assert_eq!(*done.borrow(), 0);
    run_for(&clock, &mut seq, 1.0);
    assert_eq!(*done.borrow(), 1);
}
