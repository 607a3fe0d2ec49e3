use std::collections::BTreeMap;

use vizij_sequencer_core::{
    parse_stored_sequence_json, HeadlessRenderer, ManualClock, Properties, PropertyValue,
    Sequence, SequenceBuilder, SequenceState, StoredSequence,
};

fn renderer_for(name: &str) -> HeadlessRenderer {
    let targets: BTreeMap<String, Properties> = vizij_test_fixtures::sequences::targets(name)
        .expect("targets fixture should load")
        .unwrap_or_default();
    let mut renderer = HeadlessRenderer::new();
    for (target, values) in targets {
        renderer.add_target(target, values);
    }
    renderer
}

fn load(name: &str, renderer: HeadlessRenderer) -> (ManualClock, Sequence<HeadlessRenderer>) {
    let json = vizij_test_fixtures::sequences::json(name).expect("fixture should load");
    let clock = ManualClock::new();
    let mut seq = SequenceBuilder::new()
        .clock(clock.clone())
        .build(renderer)
        .expect("sequence should build");
    seq.load_stored_json(&json).expect("fixture should be valid");
    (clock, seq)
}

fn play_to_end(clock: &ManualClock, seq: &mut Sequence<HeadlessRenderer>) -> usize {
    let done = std::rc::Rc::new(std::cell::Cell::new(0usize));
    let sink = done.clone();
    seq.on("sequence:completed", move |_| sink.set(sink.get() + 1));
    seq.start();
    while let Some(due) = seq.next_due() {
        clock.set(due);
        seq.tick();
    }
    done.get()
}

#[test]
fn every_fixture_parses() {
    let keys = vizij_test_fixtures::sequences::keys();
    assert!(keys.len() >= 3);
    for key in keys {
        let json = vizij_test_fixtures::sequences::json(&key).expect("fixture json");
        let stored = parse_stored_sequence_json(&json)
            .unwrap_or_else(|e| panic!("fixture {key} should parse: {e}"));
        assert!(!stored.steps.is_empty(), "fixture {key} has no steps");
    }
}

#[test]
fn intro_card_plays_to_completion() {
    let (clock, mut seq) = load("intro-card", renderer_for("intro-card"));
    assert_eq!(seq.name(), Some("intro-card"));
    assert_eq!(seq.steps().len(), 3);
    assert_eq!(seq.run_time(), 1_000.0);

    assert_eq!(play_to_end(&clock, &mut seq), 1);
    assert_eq!(clock_now(&clock), 1_000.0);
    assert_eq!(seq.remaining(), 0);

    let r = seq.renderer();
    assert_eq!(
        r.value("#card .title", "left"),
        Some(&PropertyValue::Number(120.0))
    );
    assert_eq!(r.value("#card .cta", "opacity"), Some(&PropertyValue::Number(1.0)));

    // the transform-family step captured the composite transform value
    let title = seq.steps_for("#card .title")[0];
    assert_eq!(
        title
            .start_params()
            .and_then(|p| p.get("transform"))
            .and_then(|v| v.as_text()),
        Some("rotate(-15deg)")
    );
}

#[test]
fn staggered_tiles_falls_back_and_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (clock, mut seq) = load("staggered-tiles", renderer_for("staggered-tiles"));
    assert!(seq.is_debug());
    let easings: Vec<&str> = seq
        .steps()
        .iter()
        .map(|s| s.options().easing.as_str())
        .collect();
    assert_eq!(easings, vec!["ease-out", "ease-out", "ease-out", "easeOutExpo"]);

    assert_eq!(play_to_end(&clock, &mut seq), 1);
    assert_eq!(clock_now(&clock), 550.0);

    seq.rewind();
    assert_eq!(seq.get_state(), SequenceState::Rewinding);
    let whens: Vec<f64> = seq.steps().iter().map(|s| s.when()).collect();
    assert_eq!(whens, vec![300.0, 200.0, 100.0, 0.0]);
}

#[test]
fn padded_fade_waits_before_completing() {
    let renderer =
        HeadlessRenderer::new().with_target("overlay", Properties::new().with("opacity", 0));
    let (clock, mut seq) = load("padded-fade", renderer);
    assert_eq!(seq.pad_time(), Some(1_000.0));
    assert_eq!(play_to_end(&clock, &mut seq), 1);
    assert_eq!(clock_now(&clock), 2_000.0);
}

#[test]
fn missing_target_fails_to_load() {
    let stored: StoredSequence =
        vizij_test_fixtures::sequences::load("padded-fade").expect("fixture should load");
    let mut seq = SequenceBuilder::new()
        .clock(ManualClock::new())
        .build(HeadlessRenderer::new())
        .expect("sequence should build");
    let err = seq.load_stored(&stored).unwrap_err();
    assert_eq!(err.category(), "configuration");
    assert!(err.to_string().contains("overlay"));
}

fn clock_now(clock: &ManualClock) -> f64 {
    use vizij_sequencer_core::Clock;
    clock.now_ms()
}

#[test]
fn failed_load_leaves_the_sequence_untouched() {
    let renderer = HeadlessRenderer::new().with_target("a", Properties::new().with("left", 0));
    let mut seq = SequenceBuilder::new()
        .clock(ManualClock::new())
        .build(renderer)
        .expect("sequence should build");
    let doc = r#"{
        "name": "x",
        "debug": true,
        "padTime": 900,
        "steps": [
            { "target": "a", "properties": { "left": 10 } },
            { "target": "ghost", "properties": { "left": 20 }, "when": 100 }
        ]
    }"#;

    let err = seq.load_stored_json(doc).unwrap_err();
    assert!(err.to_string().contains("ghost"));
    assert!(seq.steps().is_empty());
    assert_eq!(seq.pad_time(), None);
    assert_eq!(seq.name(), None);
    assert!(!seq.is_debug());

    // nothing half-loaded plays
    seq.start();
    assert_eq!(seq.pending_timers(), 0);
    assert_eq!(seq.remaining(), 0);

    let ids = seq
        .load_stored_json(&doc.replace("ghost", "a"))
        .expect("valid document should load");
    assert_eq!(ids.len(), 2);
    assert_eq!(seq.pad_time(), Some(900.0));
    assert_eq!(seq.name(), Some("x"));
}
