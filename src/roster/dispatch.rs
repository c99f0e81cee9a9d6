use super::{DayRoster, ShiftAssignment};
use crate::config::{DayOfWeek, EffectiveConfig};
use crate::error::CoverageError;
use crate::volume::DayVolume;
use chrono::Datelike;
use serde::Serialize;

/// Agent binding for one planned call. Calls of a day are numbered by
/// their position in the list returned from [`assign_calls`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSlot {
    pub bucket: String,
    pub agent: String,
    pub team: String,
    pub shift: String,
}

/// Smooth weighted round-robin with a per-agent cap. Agents at the cap
/// drop out; when no remaining agent carries weight the rest share
/// equally.
struct SmoothRoundRobin {
    weights: Vec<f64>,
    current: Vec<f64>,
    taken: Vec<u32>,
    cap: u32,
}

impl SmoothRoundRobin {
    fn new(weights: Vec<f64>, cap: u32) -> Self {
        let n = weights.len();
        Self {
            weights,
            current: vec![0.0; n],
            taken: vec![0; n],
            cap,
        }
    }

    fn next(&mut self) -> Option<usize> {
        let eligible: Vec<usize> = (0..self.weights.len())
            .filter(|idx| self.taken[*idx] < self.cap)
            .collect();
        let weighted: f64 = eligible.iter().map(|idx| self.weights[*idx].max(0.0)).sum();
        let uniform = weighted <= 0.0;
        let total = if uniform {
            eligible.len() as f64
        } else {
            weighted
        };

        let mut best: Option<usize> = None;
        for idx in eligible {
            self.current[idx] += if uniform {
                1.0
            } else {
                self.weights[idx].max(0.0)
            };
            if best.map_or(true, |b| self.current[idx] > self.current[b]) {
                best = Some(idx);
            }
        }
        let chosen = best?;
        self.current[chosen] -= total;
        self.taken[chosen] += 1;
        Some(chosen)
    }
}

fn workload(config: &EffectiveConfig, agent: &str, weekend: bool) -> f64 {
    config
        .settings
        .team
        .agents
        .iter()
        .find(|a| a.name == agent)
        .map(|a| a.workload_for(weekend))
        .unwrap_or(1.0)
}

/// Per-agent dispatch weights. With team shares configured, each team's
/// share is split between its active agents by workload. Weekend days use
/// the weekend shares and workloads where configured.
fn dispatch_weights(
    active: &[&ShiftAssignment],
    config: &EffectiveConfig,
    weekend: bool,
) -> Vec<f64> {
    let load = |agent: &str| workload(config, agent, weekend);
    let Some(profile) = &config.settings.team.team_shares else {
        return active.iter().map(|a| load(&a.agent)).collect();
    };
    let shares = profile.for_day(weekend);
    active
        .iter()
        .map(|a| {
            let team_total: f64 = active
                .iter()
                .filter(|other| other.team == a.team)
                .map(|other| load(&other.agent))
                .sum();
            let share = shares.weight_of(&a.team).unwrap_or(0.0);
            if team_total > 0.0 {
                share * load(&a.agent) / team_total
            } else {
                0.0
            }
        })
        .collect()
}

/// Binds every planned call of a day to an active agent, bucket by bucket
/// in calendar order.
pub fn assign_calls(
    roster: &DayRoster,
    volume: &DayVolume,
    config: &EffectiveConfig,
) -> Result<Vec<CallSlot>, CoverageError> {
    let cap = config.settings.team.max_calls_per_agent;
    let weekend = DayOfWeek::from(roster.date.weekday()).is_weekend();
    let mut slots = Vec::with_capacity(volume.total as usize);
    for bucket in &volume.buckets {
        if bucket.calls == 0 {
            continue;
        }
        let active: Vec<&ShiftAssignment> = roster.active_in(&bucket.name).collect();
        let mut selector = SmoothRoundRobin::new(dispatch_weights(&active, config, weekend), cap);
        for _ in 0..bucket.calls {
            let Some(idx) = selector.next() else {
                return Err(CoverageError {
                    date: roster.date,
                    bucket: bucket.name.clone(),
                    required: super::required_agents(bucket.calls, config),
                    available: active.len(),
                });
            };
            let agent = active[idx];
            slots.push(CallSlot {
                bucket: bucket.name.clone(),
                agent: agent.agent.clone(),
                team: agent.team.clone(),
                shift: agent.shift.clone(),
            });
        }
    }
    Ok(slots)
}
