//! Headless session runner.
//!
//! Runs a full session against a simulated observer and prints every
//! response. Useful for tuning staircase settings without a display.
//!
//! Usage: `rdk-headless [config.json] [seed]`

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rdk::prelude::*;
use std::error::Error;
use tracing::info;

const FRAME_MS: f64 = 16.0;
const MAX_FRAMES: u64 = 1_000_000;

/// Answers correctly with a probability that grows with coherence.
struct Observer {
    rng: SmallRng,
    threshold: f64,
    /// Frames to wait before answering.
    latency: u32,
    waited: u32,
}

impl Observer {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed ^ 0x9e37_79b9),
            threshold: 20.0,
            latency: 45,
            waited: 0,
        }
    }

    fn answer(&mut self, session: &TrialStateMachine) -> Option<Side> {
        self.waited += 1;
        if self.waited < self.latency {
            return None;
        }
        self.waited = 0;

        let p = session.coherence_percent();
        let p_correct = 0.5 + 0.5 * (p / (p + self.threshold));
        let side = session.coherent_patch_side();
        Some(if self.rng.gen_bool(p_correct.clamp(0.0, 1.0)) {
            side
        } else {
            side.other()
        })
    }
}

fn load_config(path: Option<&String>) -> Result<TrialConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(TrialConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1))?;
    let seed: u64 = match args.get(2) {
        Some(s) => s.parse()?,
        None => 0,
    };

    let mut session = TrialStateMachine::with_seed(config, seed)?;
    let mut observer = Observer::new(seed);
    let mut frames = 0u64;

    println!("=== RDK Headless Session ===");
    println!("step  correct  coherence      rt(ms)  reversal");

    while !session.is_finished() && frames < MAX_FRAMES {
        session.update(FRAME_MS)?;
        frames += 1;

        if session.state().accepts_response() {
            if let Some(side) = observer.answer(&session) {
                if let Some(o) = session.respond(side) {
                    println!(
                        "{:>4}  {:>7}  {:>5.1} -> {:<5.1}  {:>6.0}  {}",
                        o.step, o.correct, o.coherence_before, o.coherence_after, o.reaction_time, o.reversal
                    );
                }
            }
        }
    }

    info!(
        frames,
        steps = session.step_count(),
        reversals = session.reversal_count(),
        coherence = session.coherence_percent(),
        "run complete"
    );
    println!();
    println!("Final coherence: {:.2}%", session.coherence_percent());
    Ok(())
}
