//! Team and shift assignment.
//!
//! Shifts are planned once per day before any call exists: agents rotate
//! through rest days, on-duty agents draw a preferred shift pattern, and a
//! repair pass moves or calls in agents until every bucket with planned
//! calls is staffed. Calls are then dispatched to active agents by smooth
//! weighted round-robin (see [`dispatch`]).

mod dispatch;

pub use dispatch::{assign_calls, CallSlot};

use crate::calendar::DaySpec;
use crate::config::{AgentSpec, EffectiveConfig, ShiftPattern};
use crate::error::CoverageError;
use crate::rng::{Dimension, StreamFactory, StreamKey};
use crate::volume::DayVolume;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

/// One agent on one shift for one day. An agent holds at most one
/// assignment per day, so shifts never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftAssignment {
    pub agent: String,
    pub team: String,
    pub shift: String,
    pub buckets: Vec<String>,
}

impl ShiftAssignment {
    pub fn covers(&self, bucket: &str) -> bool {
        self.buckets.iter().any(|b| b == bucket)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRoster {
    pub date: NaiveDate,
    pub assignments: Vec<ShiftAssignment>,
    pub resting: Vec<String>,
}

impl DayRoster {
    pub fn active_in<'a>(&'a self, bucket: &'a str) -> impl Iterator<Item = &'a ShiftAssignment> {
        self.assignments.iter().filter(move |a| a.covers(bucket))
    }

    pub fn coverage(&self, bucket: &str) -> usize {
        self.active_in(bucket).count()
    }
}

/// Agents a bucket needs: the configured floor, or enough agents to keep
/// everyone under the per-agent call cap, whichever is larger.
pub fn required_agents(calls: u32, config: &EffectiveConfig) -> usize {
    if calls == 0 {
        return 0;
    }
    let team = &config.settings.team;
    let by_load = calls.div_ceil(team.max_calls_per_agent) as usize;
    team.min_agents_per_bucket.max(by_load)
}

pub fn plan_shifts(
    days: &[DaySpec],
    volumes: &[DayVolume],
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> Result<Vec<DayRoster>, CoverageError> {
    days.iter()
        .zip(volumes)
        .map(|(day, volume)| plan_day(day, volume, config, streams))
        .collect()
}

/// Rotation rule: agent `i` rests on the days where
/// `(day number + i) mod 7 < rest_days_per_week`, which staggers rest days
/// across the roster.
fn is_resting(date: NaiveDate, agent_idx: usize, rest_days: u8) -> bool {
    rest_days > 0 && (date.num_days_from_ce() as usize + agent_idx) % 7 < rest_days as usize
}

fn assignment(agent: &AgentSpec, pattern: &ShiftPattern) -> ShiftAssignment {
    ShiftAssignment {
        agent: agent.name.clone(),
        team: agent.team.clone(),
        shift: pattern.name.clone(),
        buckets: pattern.buckets.clone(),
    }
}

pub fn plan_day(
    day: &DaySpec,
    volume: &DayVolume,
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> Result<DayRoster, CoverageError> {
    let team = &config.settings.team;
    let mut slots: Vec<Option<&ShiftPattern>> = Vec::with_capacity(team.agents.len());
    for (idx, agent) in team.agents.iter().enumerate() {
        if is_resting(day.date, idx, team.rest_days_per_week) {
            slots.push(None);
            continue;
        }
        let key = StreamKey::new(Dimension::Shift)
            .label("preference")
            .index(day.stream_index())
            .label(agent.name.as_str());
        let mut stream = streams.stream(&key);
        let preferred = agent
            .shifts
            .pick(stream.unit())
            .and_then(|name| team.shifts.iter().find(|s| &s.name == name));
        slots.push(preferred);
    }

    let demands: Vec<(&str, usize)> = volume
        .buckets
        .iter()
        .map(|b| (b.name.as_str(), required_agents(b.calls, config)))
        .collect();
    repair_coverage(day, &mut slots, &demands, config)?;

    let mut assignments = Vec::new();
    let mut resting = Vec::new();
    for (agent, slot) in team.agents.iter().zip(&slots) {
        match slot {
            Some(pattern) => assignments.push(assignment(agent, pattern)),
            None => resting.push(agent.name.clone()),
        }
    }
    debug!(
        date = %day.date,
        on_duty = assignments.len(),
        resting = resting.len(),
        "shift roster planned"
    );
    Ok(DayRoster {
        date: day.date,
        assignments,
        resting,
    })
}

fn coverage_of(slots: &[Option<&ShiftPattern>], bucket: &str) -> usize {
    slots
        .iter()
        .flatten()
        .filter(|p| p.buckets.iter().any(|b| b == bucket))
        .count()
}

fn total_deficit(slots: &[Option<&ShiftPattern>], demands: &[(&str, usize)]) -> usize {
    demands
        .iter()
        .map(|(bucket, required)| required.saturating_sub(coverage_of(slots, bucket)))
        .sum()
}

/// Greedy repair. Each step applies the first change, in roster order,
/// that strictly lowers the total staffing deficit: moving an on-duty
/// agent to another shift (preferred patterns first), otherwise calling a
/// resting agent in. Stops with a [`CoverageError`] for the first bucket
/// no change can help.
fn repair_coverage<'a>(
    day: &DaySpec,
    slots: &mut [Option<&'a ShiftPattern>],
    demands: &[(&str, usize)],
    config: &'a EffectiveConfig,
) -> Result<(), CoverageError> {
    let team = &config.settings.team;
    loop {
        let deficit = total_deficit(slots, demands);
        if deficit == 0 {
            return Ok(());
        }
        let Some((bucket, required)) = demands
            .iter()
            .find(|(bucket, required)| coverage_of(slots, bucket) < *required)
            .copied()
        else {
            return Ok(());
        };

        let mut change: Option<(usize, &'a ShiftPattern)> = None;
        'search: for on_duty in [true, false] {
            for (idx, agent) in team.agents.iter().enumerate() {
                if slots[idx].is_some() != on_duty {
                    continue;
                }
                for pattern in candidate_shifts(agent, &team.shifts, bucket) {
                    if slots[idx].is_some_and(|current| current.name == pattern.name) {
                        continue;
                    }
                    let previous = slots[idx];
                    slots[idx] = Some(pattern);
                    let improved = total_deficit(slots, demands) < deficit;
                    slots[idx] = previous;
                    if improved {
                        change = Some((idx, pattern));
                        break 'search;
                    }
                }
            }
        }

        match change {
            Some((idx, pattern)) => {
                debug!(
                    date = %day.date,
                    bucket,
                    agent = %team.agents[idx].name,
                    shift = %pattern.name,
                    "coverage repair"
                );
                slots[idx] = Some(pattern);
            }
            None => {
                let available = coverage_of(slots, bucket);
                warn!(date = %day.date, bucket, required, available, "bucket cannot be staffed");
                return Err(CoverageError {
                    date: day.date,
                    bucket: bucket.to_string(),
                    required,
                    available,
                });
            }
        }
    }
}

/// Shift patterns covering `bucket`: the agent's weighted preferences
/// first, then the remaining patterns in configured order.
fn candidate_shifts<'a>(
    agent: &AgentSpec,
    patterns: &'a [ShiftPattern],
    bucket: &str,
) -> Vec<&'a ShiftPattern> {
    let covering = |p: &&ShiftPattern| p.buckets.iter().any(|b| b == bucket);
    let preferred = |p: &ShiftPattern| agent.shifts.weight_of(&p.name).is_some_and(|w| w > 0.0);
    let mut candidates: Vec<&ShiftPattern> = patterns
        .iter()
        .filter(covering)
        .filter(|p| preferred(*p))
        .collect();
    candidates.extend(patterns.iter().filter(covering).filter(|p| !preferred(*p)));
    candidates
}
