use super::support::{base_config, base_config_with};
use super::{date, IntegrationHarness};
use callsynth::calendar::MAX_OUTAGES_PER_DAY;
use callsynth::config::DirectOverrides;
use callsynth::generator::plan_run;
use callsynth::rng::{Seed, StreamFactory};
use callsynth::{ConfigError, GenerationError, GenerationResult};

fn override_count(count: u32) -> DirectOverrides {
    DirectOverrides {
        outage_count: Some(count),
        ..DirectOverrides::default()
    }
}

#[test]
fn explicit_override_yields_exactly_that_many_windows() -> GenerationResult<()> {
    for count in [0, 1, 4] {
        let config = base_config_with(override_count(count));
        for seed in [1_u64, 2, 3] {
            let streams = StreamFactory::new(Seed::Int(seed));
            let plan = plan_run(date("2025-09-01"), date("2025-09-30"), &config, &streams)?;
            assert_eq!(plan.calendar.outages.len(), count as usize, "seed {seed}");
        }
    }
    Ok(())
}

#[test]
fn override_beyond_eligible_days_still_yields_exact_count() -> GenerationResult<()> {
    let config = base_config_with(override_count(5));
    let streams = StreamFactory::new(Seed::Int(8));
    let plan = plan_run(date("2025-09-01"), date("2025-09-02"), &config, &streams)?;
    assert_eq!(plan.calendar.outages.len(), 5);
    for window in &plan.calendar.outages {
        assert!(window.start >= date("2025-09-01"));
        assert!(window.end <= date("2025-09-02"));
    }
    Ok(())
}

#[test]
fn outage_windows_mark_days_and_follow_up_app_issues() -> GenerationResult<()> {
    let config = base_config_with(override_count(2));
    let streams = StreamFactory::new(Seed::Int(21));
    let plan = plan_run(date("2025-09-01"), date("2025-09-21"), &config, &streams)?;
    let range = config.settings.calendar.outages.volume_multiplier;

    for window in &plan.calendar.outages {
        assert!(window.start <= window.end);
        assert!(window.volume_multiplier >= range.min && window.volume_multiplier <= range.max);
        let weekday = callsynth::config::DayOfWeek::from(chrono::Datelike::weekday(&window.start));
        assert!(!weekday.is_weekend(), "outages start on weekdays");
    }
    for day in &plan.calendar.days {
        let covered = plan.calendar.outages.iter().any(|w| w.covers(day.date));
        assert_eq!(day.has_outage(), covered, "{}", day.date);
        if day.app_issue {
            let prior = day.date - chrono::Duration::days(1);
            assert!(plan.calendar.outages.iter().any(|w| w.covers(prior)));
        }
    }
    Ok(())
}

#[test]
fn report_lists_planned_outages() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config_with(override_count(1));
    let summary = harness.run("outage-report", &config, 4, "2025-09-01", "2025-09-05")?;
    assert_eq!(summary.report.outages.len(), 1);
    assert!(summary.report.days.iter().any(|d| d.outage));

    let default_plan = plan_run(
        date("2025-09-01"),
        date("2025-09-05"),
        &base_config(),
        &StreamFactory::new(Seed::Int(4)),
    )?;
    assert!(default_plan.calendar.outages.len() <= 2);
    Ok(())
}

#[test]
fn absurd_override_is_rejected_before_scheduling() {
    let config = base_config_with(override_count(u32::MAX));
    let streams = StreamFactory::new(Seed::Int(1));
    match plan_run(date("2025-09-01"), date("2025-09-03"), &config, &streams) {
        Err(GenerationError::Config(ConfigError::InvalidValue { key, .. })) => {
            assert_eq!(key, "calendar.outages.count_override");
        }
        other => panic!("expected an invalid override, got {other:?}"),
    }

    let ceiling = (3 * MAX_OUTAGES_PER_DAY) as u32;
    let config = base_config_with(override_count(ceiling));
    let plan = plan_run(date("2025-09-01"), date("2025-09-03"), &config, &streams)
        .expect("ceiling itself is allowed");
    assert_eq!(plan.calendar.outages.len(), ceiling as usize);
}
