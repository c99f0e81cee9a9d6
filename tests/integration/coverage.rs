use super::support::{base_config, resolve_layers};
use super::{date, IntegrationHarness};
use callsynth::config::DirectOverrides;
use callsynth::generator::plan_run;
use callsynth::rng::{Seed, StreamFactory};
use callsynth::roster::required_agents;
use callsynth::{GenerationError, GenerationResult};
use serde_json::json;
use std::collections::BTreeSet;

#[test]
fn every_bucket_with_calls_is_staffed() -> GenerationResult<()> {
    let config = base_config();
    let streams = StreamFactory::new(Seed::Int(11));
    let plan = plan_run(date("2025-09-01"), date("2025-10-12"), &config, &streams)?;
    let floor = config.settings.team.min_agents_per_bucket;

    for (roster, volume) in plan.rosters.iter().zip(&plan.volumes) {
        for bucket in &volume.buckets {
            if bucket.calls == 0 {
                continue;
            }
            let active = roster.coverage(&bucket.name);
            assert!(
                active >= floor.max(required_agents(bucket.calls, &config)),
                "{} {} has {} agents for {} calls",
                roster.date,
                bucket.name,
                active,
                bucket.calls
            );
        }
        let agents: BTreeSet<_> = roster.assignments.iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(agents.len(), roster.assignments.len(), "one shift per agent per day");
        for agent in &roster.resting {
            assert!(!agents.contains(agent.as_str()));
        }
    }
    Ok(())
}

#[test]
fn calls_only_go_to_agents_active_in_their_bucket() -> GenerationResult<()> {
    let config = base_config();
    let streams = StreamFactory::new(Seed::Int(12));
    let plan = plan_run(date("2025-09-01"), date("2025-09-07"), &config, &streams)?;
    let cap = config.settings.team.max_calls_per_agent as usize;

    for (roster, slots) in plan.rosters.iter().zip(&plan.slots) {
        for slot in slots {
            let assignment = roster
                .assignments
                .iter()
                .find(|a| a.agent == slot.agent)
                .expect("dispatched agent is on shift");
            assert!(assignment.covers(&slot.bucket));
            assert_eq!(assignment.shift, slot.shift);
            assert_eq!(assignment.team, slot.team);
        }
        for assignment in &roster.assignments {
            for bucket in &assignment.buckets {
                let taken = slots
                    .iter()
                    .filter(|s| s.agent == assignment.agent && &s.bucket == bucket)
                    .count();
                assert!(taken <= cap);
            }
        }
    }
    Ok(())
}

#[test]
fn undersized_roster_is_a_coverage_error() {
    let config = resolve_layers(
        vec![json!({ "team": { "min_agents_per_bucket": 20 } })],
        &DirectOverrides::default(),
    )
    .expect("configuration itself is valid");
    let harness = IntegrationHarness::new();
    let result = harness.run("undersized", &config, 1, "2025-09-01", "2025-09-02");

    match result {
        Err(GenerationError::Coverage(err)) => {
            assert_eq!(err.date, date("2025-09-01"));
            assert_eq!(err.required, 20);
            assert!(err.available < 20);
            assert!(config.settings.calendar.time_buckets.contains(&err.bucket));
        }
        other => panic!("expected a coverage error, got {other:?}"),
    }
    assert!(
        !harness.out_dir("undersized").exists(),
        "coverage errors abort before any output"
    );
}
