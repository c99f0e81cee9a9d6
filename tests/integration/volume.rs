use super::support::{base_config, base_config_with};
use super::date;
use callsynth::config::DirectOverrides;
use callsynth::generator::plan_run;
use callsynth::rng::{Seed, StreamFactory};
use callsynth::volume::raw_daily_total;
use callsynth::GenerationResult;

#[test]
fn bucket_counts_sum_to_rounded_daily_total() -> GenerationResult<()> {
    let config = base_config_with(DirectOverrides {
        outage_count: Some(3),
        ..DirectOverrides::default()
    });
    let streams = StreamFactory::new(Seed::Int(2024));
    let plan = plan_run(date("2025-09-01"), date("2025-09-28"), &config, &streams)?;

    assert_eq!(plan.volumes.len(), 28);
    for (day, volume) in plan.calendar.days.iter().zip(&plan.volumes) {
        let expected = raw_daily_total(day, &config).round_ties_even() as u32;
        assert_eq!(volume.total, expected, "daily total on {}", day.date);
        assert_eq!(volume.bucket_sum(), volume.total, "bucket sum on {}", day.date);
    }
    for (volume, slots) in plan.volumes.iter().zip(&plan.slots) {
        assert_eq!(slots.len() as u32, volume.total);
        for bucket in &volume.buckets {
            let dispatched = slots.iter().filter(|s| s.bucket == bucket.name).count() as u32;
            assert_eq!(dispatched, bucket.calls);
        }
    }
    Ok(())
}

#[test]
fn outage_days_carry_more_volume_than_their_baseline() -> GenerationResult<()> {
    let config = base_config_with(DirectOverrides {
        outage_count: Some(2),
        ..DirectOverrides::default()
    });
    let streams = StreamFactory::new(Seed::Int(5));
    let plan = plan_run(date("2025-09-01"), date("2025-09-14"), &config, &streams)?;

    let outage_days: Vec<_> = plan.calendar.days.iter().filter(|d| d.has_outage()).collect();
    assert!(!outage_days.is_empty());
    let volume = &config.settings.volume;
    for day in outage_days {
        let baseline = volume.baseline_weekday * day.weekday_factor * volume.scale;
        assert!(raw_daily_total(day, &config) >= baseline * 1.25 - 1e-9);
    }
    Ok(())
}

#[test]
fn weekend_days_use_the_weekend_baseline() -> GenerationResult<()> {
    let config = base_config();
    let streams = StreamFactory::new(Seed::Int(3));
    let plan = plan_run(date("2025-09-06"), date("2025-09-07"), &config, &streams)?;
    let volume = &config.settings.volume;
    for day in &plan.calendar.days {
        assert!(day.is_weekend());
        if !day.has_outage() && !day.app_issue {
            let expected = volume.baseline_weekend * day.weekday_factor * volume.scale;
            assert!((raw_daily_total(day, &config) - expected).abs() < 1e-9);
        }
    }
    Ok(())
}
