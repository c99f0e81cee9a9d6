//! Calendar and outage planning.

use crate::config::{DayOfWeek, EffectiveConfig};
use crate::error::ConfigError;
use crate::rng::{Dimension, StreamFactory, StreamKey};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// One time-of-day bucket and its share of the day's volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub name: String,
    pub share: f64,
}

/// Time-bounded incident; both ends inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutageWindow {
    pub id: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub volume_multiplier: f64,
}

impl OutageWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A planned calendar day. Read-only after planning.
#[derive(Debug, Clone, Serialize)]
pub struct DaySpec {
    pub index: usize,
    pub date: NaiveDate,
    pub weekday: DayOfWeek,
    pub weekday_factor: f64,
    pub buckets: Vec<TimeBucket>,
    pub outages: Vec<OutageWindow>,
    pub app_issue: bool,
    pub premium_wait_peak: bool,
}

impl DaySpec {
    pub fn is_weekend(&self) -> bool {
        self.weekday.is_weekend()
    }

    pub fn has_outage(&self) -> bool {
        !self.outages.is_empty()
    }

    /// Largest multiplier among overlapping windows, 1.0 without outage.
    pub fn outage_multiplier(&self) -> f64 {
        self.outages
            .iter()
            .map(|w| w.volume_multiplier)
            .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))))
            .unwrap_or(1.0)
    }

    /// Stable per-day stream index, independent of the range start.
    pub fn stream_index(&self) -> u64 {
        self.date.num_days_from_ce() as u64
    }

    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CalendarPlan {
    pub days: Vec<DaySpec>,
    pub outages: Vec<OutageWindow>,
}

/// Inclusive day sequence; empty when `end < start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += Duration::days(1);
    }
    dates
}

/// Upper bound on overridden outage windows, per day of the range.
pub const MAX_OUTAGES_PER_DAY: usize = 8;

pub fn plan_calendar(
    start: NaiveDate,
    end: NaiveDate,
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> Result<CalendarPlan, ConfigError> {
    let dates = date_range(start, end);
    if dates.is_empty() {
        info!(%start, %end, "date range is empty, nothing to plan");
        return Ok(CalendarPlan::default());
    }
    let calendar = &config.settings.calendar;
    let outages = schedule_outages(&dates, config, streams)?;
    let app_issue_after = calendar.outages.app_issue_days_after as i64;

    let days = dates
        .iter()
        .enumerate()
        .map(|(index, date)| {
            let weekday = DayOfWeek::from(date.weekday());
            let profile = calendar.bucket_shares.for_day(weekday.is_weekend());
            let shares = profile.shares();
            let buckets = calendar
                .time_buckets
                .iter()
                .map(|name| TimeBucket {
                    name: name.clone(),
                    share: shares
                        .iter()
                        .find(|(option, _)| *option == name)
                        .map(|(_, share)| *share)
                        .unwrap_or(0.0),
                })
                .collect();
            let active: Vec<OutageWindow> =
                outages.iter().filter(|w| w.covers(*date)).cloned().collect();
            let app_issue = app_issue_after > 0
                && outages.iter().any(|w| {
                    *date > w.end && *date <= w.end + Duration::days(app_issue_after)
                });
            DaySpec {
                index,
                date: *date,
                weekday,
                weekday_factor: calendar.weekday_factor(weekday),
                buckets,
                outages: active,
                app_issue,
                premium_wait_peak: calendar.premium_wait_peak_days.contains(&weekday),
            }
        })
        .collect();

    Ok(CalendarPlan { days, outages })
}

fn schedule_outages(
    dates: &[NaiveDate],
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> Result<Vec<OutageWindow>, ConfigError> {
    let settings = &config.settings.calendar.outages;
    let count = match settings.count_override {
        Some(count) => count as usize,
        None => {
            let mut stream = streams.stream(&StreamKey::new(Dimension::Outage).label("count"));
            settings.count.pick(stream.unit()).copied().unwrap_or(0) as usize
        }
    };
    let Some(&last) = dates.last() else {
        return Ok(Vec::new());
    };
    if count == 0 {
        return Ok(Vec::new());
    }
    let limit = dates.len().saturating_mul(MAX_OUTAGES_PER_DAY);
    if count > limit {
        return Err(ConfigError::InvalidValue {
            key: "calendar.outages.count_override".into(),
            message: format!(
                "{count} outage windows requested for {} days, at most {limit} allowed",
                dates.len()
            ),
        });
    }

    let weekdays: Vec<NaiveDate> = dates
        .iter()
        .copied()
        .filter(|d| !DayOfWeek::from(d.weekday()).is_weekend())
        .collect();
    let eligible = if settings.weekdays_only && !weekdays.is_empty() {
        weekdays
    } else {
        dates.to_vec()
    };

    let mut available = eligible.clone();
    let mut windows = Vec::new();
    for id in 0..count {
        if available.is_empty() {
            available = eligible.clone();
        }
        let key = StreamKey::new(Dimension::Outage)
            .label("window")
            .index(id as u64);
        let mut stream = streams.stream(&key);
        let start = available.remove(stream.below(available.len()));
        let duration = settings
            .duration_days
            .pick(stream.unit())
            .copied()
            .unwrap_or(1)
            .max(1);
        let end = (start + Duration::days(duration as i64 - 1)).min(last);
        let range = settings.volume_multiplier;
        let window = OutageWindow {
            id,
            start,
            end,
            volume_multiplier: stream.uniform(range.min, range.max),
        };
        debug!(
            id,
            start = %window.start,
            end = %window.end,
            multiplier = window.volume_multiplier,
            "outage window scheduled"
        );
        windows.push(window);
    }
    Ok(windows)
}
