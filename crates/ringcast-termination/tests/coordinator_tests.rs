use std::time::{Duration, Instant};

use ringcast_termination::*;

/// Drive the coordinator through a sequence of rounds; `true` marks a round
/// in which an event was observed. Returns the round at which termination was
/// decided, if any.
fn run_rounds(threshold: u32, rounds: &[bool]) -> (TerminationCoordinator, Option<u64>) {
    let mut coordinator = TerminationCoordinator::new(3, threshold).unwrap();
    let mut now = Instant::now();
    assert_eq!(
        coordinator.on_token_arrival(now, false).unwrap(),
        TokenArrival::FirstPossession
    );

    for (i, eventful) in rounds.iter().enumerate() {
        now += Duration::from_millis(10 + i as u64);
        match coordinator.on_token_arrival(now, *eventful).unwrap() {
            TokenArrival::Closed(closure) if closure.decision == RoundDecision::Terminate => {
                return (coordinator, Some(closure.record.index));
            }
            TokenArrival::Closed(_) => {}
            TokenArrival::FirstPossession => panic!("only the first arrival opens a round"),
        }
    }
    (coordinator, None)
}

#[test]
fn test_quiet_counter_law() {
    let pattern = [false, true, false, false, true, false, false, false];
    let mut coordinator = TerminationCoordinator::new(1, 100).unwrap();
    let mut now = Instant::now();
    coordinator.on_token_arrival(now, false).unwrap();

    let mut expected = 0u32;
    for eventful in pattern {
        now += Duration::from_millis(5);
        coordinator.on_token_arrival(now, eventful).unwrap();
        expected = if eventful { 0 } else { expected + 1 };
        assert_eq!(coordinator.quiet_rounds(), expected);
    }
}

#[test]
fn test_terminates_exactly_when_threshold_first_reached() {
    let (_, decided) = run_rounds(3, &[false, false, true, false, false, false, false]);
    assert_eq!(decided, Some(6));
}

#[test]
fn test_no_termination_below_threshold() {
    let (coordinator, decided) = run_rounds(4, &[false, false, false, true, false, false, false]);
    assert_eq!(decided, None);
    assert!(!coordinator.is_terminated());
    assert_eq!(coordinator.rounds_completed(), 7);
}

#[test]
fn test_eventful_first_round_then_two_quiet_rounds() {
    let (coordinator, decided) = run_rounds(2, &[true, false, false]);
    assert_eq!(decided, Some(3));
    let flags: Vec<bool> = coordinator.records().iter().map(|r| r.eventful).collect();
    assert_eq!(flags, vec![true, false, false]);
}

#[test]
fn test_stats_invariants_hold_over_recorded_rounds() {
    let (coordinator, _) = run_rounds(50, &[false; 20]);
    let stats = coordinator.stats();
    assert_eq!(stats.total_rounds, 20);
    assert!(stats.min_round_ms >= 0.0);
    assert!(stats.min_round_ms <= stats.avg_round_ms);
    assert!(stats.avg_round_ms <= stats.max_round_ms);
    for record in coordinator.records() {
        assert!(record.duration >= Duration::ZERO);
    }
}

#[test]
fn test_summary_line_parses_back() {
    let (coordinator, _) = run_rounds(2, &[false, false]);
    let stats = coordinator.stats();
    let parsed: RoundStats = stats.summary_line().parse().unwrap();
    assert_eq!(parsed.process_count, 3);
    assert_eq!(parsed.total_rounds, 2);
}
