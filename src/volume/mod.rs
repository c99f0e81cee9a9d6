//! Volume allocation per day and time-of-day bucket.
//!
//! The daily total and every bucket count are rounded half-to-even from
//! the same raw product, then buckets are nudged by at most one call each
//! until they sum to the rounded total. Adding walks buckets by largest
//! positive remainder, removing by most negative remainder; ties keep
//! bucket order.

use crate::calendar::DaySpec;
use crate::config::EffectiveConfig;
use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketVolume {
    pub name: String,
    pub calls: u32,
}

/// Planned call counts for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayVolume {
    pub date: NaiveDate,
    pub total: u32,
    pub buckets: Vec<BucketVolume>,
}

impl DayVolume {
    pub fn calls_in(&self, bucket: &str) -> u32 {
        self.buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.calls)
            .unwrap_or(0)
    }

    pub fn bucket_sum(&self) -> u32 {
        self.buckets.iter().map(|b| b.calls).sum()
    }
}

/// Unrounded daily volume: baseline, weekday factor, global scale and the
/// strongest active incident multiplier.
pub fn raw_daily_total(day: &DaySpec, config: &EffectiveConfig) -> f64 {
    let volume = &config.settings.volume;
    let baseline = if day.is_weekend() {
        volume.baseline_weekend
    } else {
        volume.baseline_weekday
    };
    let incident = if day.has_outage() {
        day.outage_multiplier()
    } else if day.app_issue {
        volume.app_issue_multiplier
    } else {
        1.0
    };
    baseline * day.weekday_factor * volume.scale * incident
}

pub fn allocate_day(day: &DaySpec, config: &EffectiveConfig) -> Result<DayVolume, ConfigError> {
    let raw = raw_daily_total(day, config);
    if raw.is_nan() || raw < 0.0 {
        return Err(ConfigError::NegativeVolume {
            date: day.date,
            total: raw,
        });
    }
    if !raw.is_finite() {
        return Err(ConfigError::InvalidValue {
            key: "volume".into(),
            message: format!("daily volume for {} is not finite", day.date),
        });
    }
    let shares: Vec<f64> = day.buckets.iter().map(|b| b.share).collect();
    let (total, counts) = split_total(raw, &shares);
    debug!(date = %day.date, raw, total, "daily volume allocated");
    Ok(DayVolume {
        date: day.date,
        total,
        buckets: day
            .buckets
            .iter()
            .zip(counts)
            .map(|(bucket, calls)| BucketVolume {
                name: bucket.name.clone(),
                calls,
            })
            .collect(),
    })
}

pub fn allocate_days(
    days: &[DaySpec],
    config: &EffectiveConfig,
) -> Result<Vec<DayVolume>, ConfigError> {
    days.iter().map(|day| allocate_day(day, config)).collect()
}

/// Splits a non-negative raw total across buckets by share. Returns the
/// rounded daily total and per-bucket counts that sum to it exactly.
pub fn split_total(raw_total: f64, shares: &[f64]) -> (u32, Vec<u32>) {
    let total = raw_total.max(0.0).round_ties_even() as i64;
    if shares.is_empty() {
        return (0, Vec::new());
    }
    let exact: Vec<f64> = shares.iter().map(|s| raw_total * s.max(0.0)).collect();
    let mut counts: Vec<i64> = exact.iter().map(|e| e.round_ties_even() as i64).collect();
    let remainders: Vec<f64> = exact
        .iter()
        .zip(&counts)
        .map(|(e, c)| e - *c as f64)
        .collect();

    let diff = total - counts.iter().sum::<i64>();
    match diff.cmp(&0) {
        Ordering::Greater => {
            let mut order: Vec<usize> = (0..counts.len()).filter(|i| shares[*i] > 0.0).collect();
            // stable sort keeps bucket order on equal remainders
            order.sort_by(|a, b| remainders[*b].total_cmp(&remainders[*a]));
            for idx in order.iter().cycle().take(diff as usize) {
                counts[*idx] += 1;
            }
        }
        Ordering::Less => {
            let mut order: Vec<usize> = (0..counts.len()).collect();
            order.sort_by(|a, b| remainders[*a].total_cmp(&remainders[*b]));
            let mut missing = -diff;
            while missing > 0 {
                let before = missing;
                for idx in &order {
                    if missing == 0 {
                        break;
                    }
                    if counts[*idx] > 0 {
                        counts[*idx] -= 1;
                        missing -= 1;
                    }
                }
                if missing == before {
                    break;
                }
            }
        }
        Ordering::Equal => {}
    }

    let counts: Vec<u32> = counts.into_iter().map(|c| c.max(0) as u32).collect();
    (counts.iter().sum(), counts)
}
