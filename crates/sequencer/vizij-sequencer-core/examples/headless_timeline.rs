//! Drive a stored sequence through the headless renderer on a simulated
//! clock and print each lifecycle event.
//!
//! RUST_LOG=debug cargo run -p vizij-sequencer-core --example headless_timeline

use vizij_sequencer_core::{
    HeadlessRenderer, ManualClock, Properties, SequenceBuilder, SequenceCommand,
};

const TIMELINE: &str = r#"{
    "name": "headless-demo",
    "debug": true,
    "padTime": 200,
    "steps": [
        { "target": "panel", "properties": { "opacity": 1, "top": 24 }, "duration": 300, "easing": "easeOutQuad" },
        { "target": "badge", "properties": { "scale": 1.2 }, "duration": 200, "when": 150, "easing": "easeOutBack" },
        { "target": "panel", "properties": { "left": "+=40" }, "duration": 250, "when": 450 }
    ]
}"#;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let renderer = HeadlessRenderer::new()
        .with_target("panel", Properties::new().with("opacity", 0).with("top", 0).with("left", 0))
        .with_target("badge", Properties::new().with("scale", 0.8));
    let clock = ManualClock::new();
    let mut seq = SequenceBuilder::new().clock(clock.clone()).build(renderer)?;
    seq.load_stored_json(TIMELINE)?;

    for name in [
        "sequence:started",
        "animation:completed",
        "sequence:animated",
        "sequence:completed",
        "sequence:rewinding",
    ] {
        seq.on(name, |ctx| {
            let step = ctx
                .step()
                .map(|s| format!(" {} ({})", s.id, s.target))
                .unwrap_or_default();
            println!("{:<22}{} remaining={}", ctx.name(), step, ctx.remaining);
        });
    }
    // play forward once, then rewind back to the original style
    let mut rewound = false;
    seq.on("sequence:completed", move |ctx| {
        if !rewound {
            rewound = true;
            ctx.request(SequenceCommand::Rewind);
        }
    });

    seq.start();
    while let Some(due) = seq.next_due() {
        clock.set(due);
        seq.tick();
    }

    let r = seq.renderer();
    for target in ["panel", "badge"] {
        println!("{target}: {:?}", r.values(target));
    }
    Ok(())
}
