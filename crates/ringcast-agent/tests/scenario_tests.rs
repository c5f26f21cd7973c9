//! Whole-ring runs on in-memory transports with scripted randomness.

use std::time::Duration;

use ringcast_agent::{
    AgentConfig, AgentError, RingParameters, Simulation, SimulationOutcome, TimingConfig,
};
use ringcast_network::TokenLoss;
use ringcast_protocol::AgentId;
use ringcast_state::{RandomSource, ScriptedSource};

fn fast_config() -> AgentConfig {
    AgentConfig {
        timing: TimingConfig {
            poll_timeout_ms: 50,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
            startup_stagger_ms: 0,
            leader_settle_per_agent_ms: 0,
            round_settle_ms: 5,
            terminate_linger_ms: 10,
        },
        ..AgentConfig::default()
    }
}

#[tokio::test]
async fn test_single_agent_zero_probability_terminates_after_one_round() {
    let report = Simulation::new(RingParameters::new(1, 1, 0.0), fast_config())
        .unwrap()
        .with_deadline(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, SimulationOutcome::Terminated);
    assert_eq!(report.stats.process_count, 1);
    assert_eq!(report.stats.total_rounds, 1);
    assert_eq!(report.total_events, 0);
}

#[tokio::test]
async fn test_one_event_then_quiet_rounds() {
    let report = Simulation::new(RingParameters::new(3, 2, 0.5), fast_config())
        .unwrap()
        .with_deadline(Duration::from_secs(5))
        .with_sources(Box::new(|agent: AgentId| -> Box<dyn RandomSource> {
            if agent.is_leader() {
                // First trial fires, everything after stays above p.
                Box::new(ScriptedSource::new([0.0], 0.999))
            } else {
                Box::new(ScriptedSource::constant(0.999))
            }
        }))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, SimulationOutcome::Terminated);
    assert_eq!(report.stats.total_rounds, 3);
    assert_eq!(report.total_events, 1);
    assert_eq!(report.agents[0].events_fired, 1);
    // Leader holds at the start of rounds 1-3, then retires the token.
    assert_eq!(report.agents[0].holds, 3);
    assert_eq!(report.agents[1].holds, 3);
    assert_eq!(report.agents[2].holds, 3);
    assert_eq!(report.agents[1].final_probability, 0.5 / 8.0);
}

#[tokio::test]
async fn test_lost_token_stalls_until_supervision_deadline() {
    let report = Simulation::new(RingParameters::new(3, 1_000, 0.0), fast_config())
        .unwrap()
        .with_deadline(Duration::from_millis(500))
        .with_token_loss(TokenLoss {
            from: AgentId::new(1),
            send_number: 2,
        })
        .with_sources(Box::new(|_: AgentId| -> Box<dyn RandomSource> {
            Box::new(ScriptedSource::constant(0.999))
        }))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, SimulationOutcome::SupervisionTimeout);
    assert_eq!(report.dropped_tokens, 1);
    assert_eq!(report.stats.total_rounds, 1);
    assert_eq!(report.total_events, 0);
}

#[tokio::test]
async fn test_seeded_run_terminates_with_consistent_stats() {
    let mut config = fast_config();
    config.run.seed = Some(7);

    let report = Simulation::new(RingParameters::new(4, 3, 0.9), config)
        .unwrap()
        .with_deadline(Duration::from_secs(20))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, SimulationOutcome::Terminated);
    assert!(report.stats.total_rounds >= 3);
    assert!(report.stats.min_round_ms >= 0.0);
    assert!(report.stats.min_round_ms <= report.stats.avg_round_ms);
    assert!(report.stats.avg_round_ms <= report.stats.max_round_ms);
    assert_eq!(report.agents.len(), 4);
    assert_eq!(
        report.total_events,
        report.agents.iter().map(|a| a.events_fired).sum::<u64>()
    );
}

#[tokio::test]
async fn test_invalid_parameters_rejected() {
    assert!(Simulation::new(RingParameters::new(0, 2, 0.5), fast_config()).is_err());
    assert!(Simulation::new(RingParameters::new(3, 0, 0.5), fast_config()).is_err());
    assert!(Simulation::new(RingParameters::new(3, 2, -0.1), fast_config()).is_err());

    let mut config = fast_config();
    config.timing.jitter_min_ms = 10;
    config.timing.jitter_max_ms = 5;
    assert!(Simulation::new(RingParameters::new(3, 2, 0.5), config).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_agent_event_counts_in_its_own_round() {
    // P1 fires on its first hold and forwards straight to the leader, so its
    // EVENT races the token home on every run.
    for _ in 0..10 {
        let report = Simulation::new(RingParameters::new(2, 1, 0.5), fast_config())
            .unwrap()
            .with_deadline(Duration::from_secs(5))
            .with_sources(Box::new(|agent: AgentId| -> Box<dyn RandomSource> {
                if agent.is_leader() {
                    Box::new(ScriptedSource::constant(0.999))
                } else {
                    Box::new(ScriptedSource::new([0.0], 0.999))
                }
            }))
            .run()
            .await
            .unwrap();

        assert_eq!(report.outcome, SimulationOutcome::Terminated);
        assert_eq!(report.total_events, 1);
        assert_eq!(report.stats.total_rounds, 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_round_settle_rejected_for_shared_ring() {
    let mut config = fast_config();
    config.timing.round_settle_ms = 0;

    assert!(matches!(
        Simulation::new(RingParameters::new(2, 1, 0.5), config.clone()),
        Err(AgentError::Config(_))
    ));
    // A lone leader marks its own events; nothing to race.
    assert!(Simulation::new(RingParameters::new(1, 1, 0.5), config).is_ok());
}

#[tokio::test]
async fn test_leader_lingers_after_terminate() {
    let mut config = fast_config();
    config.timing.terminate_linger_ms = 150;

    let started = std::time::Instant::now();
    let report = Simulation::new(RingParameters::new(1, 1, 0.0), config)
        .unwrap()
        .with_deadline(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, SimulationOutcome::Terminated);
    assert!(started.elapsed() >= Duration::from_millis(150));
}
