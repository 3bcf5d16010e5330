//! Property-based tests for the state machine guarantees.
//!
//! For any sequence of reported errors, timer ticks, and completion
//! signals, the phase's severity is non-decreasing — the machine never
//! de-escalates except through an explicit `reset()`.

use std::sync::Arc;

use proptest::prelude::*;

use rehydrate_core::{
    ErrorSource, HydrationWatchdog, ManualClock, MemoryStore, NoopReload, Phase, WatchdogConfig,
};

#[derive(Debug, Clone)]
enum Event {
    Error(ErrorSource, u8),
    Complete,
    Advance(u16),
    PollTimeout,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        (
            prop_oneof![
                Just(ErrorSource::ServerRenderError),
                Just(ErrorSource::HydrationMismatch),
                Just(ErrorSource::RuntimeError),
            ],
            0u8..5,
        )
            .prop_map(|(source, n)| Event::Error(source, n)),
        Just(Event::Complete),
        (0u16..15_000).prop_map(Event::Advance),
        Just(Event::PollTimeout),
    ]
}

fn fresh_watchdog(clock: Arc<ManualClock>) -> HydrationWatchdog {
    HydrationWatchdog::new(
        WatchdogConfig::default(),
        Arc::new(MemoryStore::with_clock(clock.clone())),
        Arc::new(MemoryStore::with_clock(clock.clone())),
        clock,
        Box::new(NoopReload),
    )
}

proptest! {
    #[test]
    fn severity_never_decreases(events in prop::collection::vec(event_strategy(), 0..40)) {
        let clock = Arc::new(ManualClock::new(50_000));
        let mut wd = fresh_watchdog(clock.clone());
        wd.start();
        let mut last = wd.phase().severity();

        for event in events {
            match event {
                Event::Error(source, n) => {
                    wd.report_error(source, &format!("error variant {n}"), None);
                }
                Event::Complete => wd.report_hydration_complete(),
                Event::Advance(ms) => clock.advance(ms as u64),
                Event::PollTimeout => {
                    wd.poll_timeout();
                }
            }
            let severity = wd.phase().severity();
            prop_assert!(
                severity >= last,
                "severity decreased: {} -> {} (phase {:?})",
                last,
                severity,
                wd.phase()
            );
            last = severity;
        }
    }

    #[test]
    fn terminal_phase_is_sticky(events in prop::collection::vec(event_strategy(), 1..40)) {
        let clock = Arc::new(ManualClock::new(50_000));
        let mut wd = fresh_watchdog(clock.clone());
        wd.start();
        let mut terminal_phase: Option<Phase> = None;

        for event in events {
            match event {
                Event::Error(source, n) => {
                    wd.report_error(source, &format!("error variant {n}"), None);
                }
                Event::Complete => wd.report_hydration_complete(),
                Event::Advance(ms) => clock.advance(ms as u64),
                Event::PollTimeout => {
                    wd.poll_timeout();
                }
            }
            match terminal_phase {
                None if wd.phase().is_terminal() => terminal_phase = Some(wd.phase()),
                Some(frozen) => prop_assert_eq!(wd.phase(), frozen),
                None => {}
            }
        }
    }
}
