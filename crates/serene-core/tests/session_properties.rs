//! Property tests for the breathing session engine.
//!
//! Drives the engine with arbitrary command sequences and checks the
//! timing invariants after every step.

use proptest::prelude::*;
use serene_core::{
    BreathingPattern, MemoryBackend, Phase, SessionConfig, SessionEngine, SessionLog,
};

#[derive(Debug, Clone, Copy)]
enum Op {
    Tick,
    Toggle,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![8 => Just(Op::Tick), 1 => Just(Op::Toggle)]
}

fn pattern_key() -> impl Strategy<Value = &'static str> {
    prop::sample::select(
        BreathingPattern::all()
            .iter()
            .map(|p| p.key)
            .collect::<Vec<_>>(),
    )
}

fn engine(key: &str, target: u64) -> SessionEngine<SessionLog<MemoryBackend>> {
    SessionEngine::new(
        SessionConfig::new(key, target).unwrap(),
        SessionLog::new(MemoryBackend::new()),
    )
}

proptest! {
    #[test]
    fn remaining_stays_in_bounds_and_counts_down(
        key in pattern_key(),
        n in 0usize..400,
    ) {
        let mut engine = engine(key, 180);
        let pattern = engine.config().pattern();
        engine.start().unwrap();

        for _ in 0..n {
            let (phase, remaining) = (engine.phase(), engine.secs_remaining());
            prop_assert!(remaining <= pattern.longest_phase_secs());
            engine.tick();
            if remaining > 0 {
                prop_assert_eq!(engine.phase(), phase);
                prop_assert_eq!(engine.secs_remaining(), remaining - 1);
            } else {
                prop_assert_eq!(engine.phase(), phase.next());
                prop_assert_eq!(engine.secs_remaining(), pattern.duration_of(phase.next()));
            }
        }
    }

    #[test]
    fn elapsed_is_monotonic_and_frozen_while_paused(
        key in pattern_key(),
        ops in prop::collection::vec(op(), 0..300),
    ) {
        let mut engine = engine(key, 300);
        engine.start().unwrap();

        for op in ops {
            let running = engine.is_running();
            let before = (engine.phase(), engine.secs_remaining(), engine.elapsed_secs());
            match op {
                Op::Tick => {
                    engine.tick();
                    let after = (engine.phase(), engine.secs_remaining(), engine.elapsed_secs());
                    if running {
                        prop_assert!(after.2 >= before.2);
                        prop_assert!(after.2 - before.2 <= 1);
                    } else {
                        prop_assert_eq!(after, before);
                    }
                }
                Op::Toggle => {
                    engine.toggle_running();
                    prop_assert_eq!(engine.is_running(), !running);
                    prop_assert_eq!(
                        (engine.phase(), engine.secs_remaining(), engine.elapsed_secs()),
                        before
                    );
                }
            }
        }
    }

    #[test]
    fn progress_is_always_a_fraction(
        key in pattern_key(),
        target in 1u64..50,
        n in 0usize..200,
    ) {
        let mut engine = engine(key, target);
        engine.start().unwrap();
        for _ in 0..n {
            engine.tick();
            let progress = engine.progress_fraction();
            prop_assert!((0.0..=1.0).contains(&progress));
        }
    }

    #[test]
    fn end_always_returns_to_idle_with_matching_flag(
        key in pattern_key(),
        target in 1u64..60,
        ops in prop::collection::vec(op(), 0..150),
    ) {
        let mut engine = engine(key, target);
        engine.start().unwrap();
        for op in ops {
            match op {
                Op::Tick => { engine.tick(); }
                Op::Toggle => { engine.toggle_running(); }
            }
        }
        let elapsed = engine.elapsed_secs();

        let ended = engine.end().unwrap();
        let serene_core::Event::SessionEnded { record, .. } = ended else {
            panic!("expected SessionEnded");
        };
        prop_assert_eq!(record.elapsed_secs, elapsed);
        prop_assert_eq!(record.completed, elapsed >= target);
        prop_assert!(!engine.is_active());
        prop_assert_eq!(engine.phase(), Phase::Inhale);
        prop_assert_eq!(engine.elapsed_secs(), 0);
    }
}
