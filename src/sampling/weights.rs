use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Ordered `[option, weight]` pairs. Order is significant: cumulative
/// inversion walks the table front to back, so the same draw always maps
/// to the same option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable<T> {
    entries: Vec<(T, f64)>,
}

impl<T> Default for WeightTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> WeightTable<T> {
    pub fn new(entries: Vec<(T, f64)>) -> Self {
        Self { entries }
    }

    pub fn single(option: T) -> Self {
        Self::new(vec![(option, 1.0)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.entries.iter().map(|(option, weight)| (option, *weight))
    }

    pub fn options(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(option, _)| option)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, option: &T) -> bool {
        self.entries.iter().any(|(candidate, _)| candidate == option)
    }

    pub fn weight_of(&self, option: &T) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == option)
            .map(|(_, weight)| *weight)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight.max(0.0)).sum()
    }

    /// Weights normalized to shares that sum to one. Empty when the table
    /// has no positive weight.
    pub fn shares(&self) -> Vec<(&T, f64)> {
        let total = self.total();
        if total <= 0.0 {
            return Vec::new();
        }
        self.entries
            .iter()
            .map(|(option, weight)| (option, weight.max(0.0) / total))
            .collect()
    }

    /// Maps a uniform draw in `[0, 1)` to an option by cumulative-weight
    /// inversion.
    pub fn pick(&self, draw: f64) -> Option<&T> {
        let weights: Vec<f64> = self.entries.iter().map(|(_, w)| *w).collect();
        pick_index(&weights, draw).map(|idx| &self.entries[idx].0)
    }
}

impl<T: PartialEq + Display> WeightTable<T> {
    /// Eager distribution check: finite, non-negative weights with a
    /// positive total and no duplicate options.
    pub fn check(&self, key: &str) -> Result<(), ConfigError> {
        for (idx, (option, weight)) in self.entries.iter().enumerate() {
            if !weight.is_finite() {
                return Err(ConfigError::InvalidValue {
                    key: format!("{key}.{option}"),
                    message: format!("weight {weight} is not finite"),
                });
            }
            if *weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    key: key.to_string(),
                    option: option.to_string(),
                    weight: *weight,
                });
            }
            if self.entries[..idx].iter().any(|(seen, _)| seen == option) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("option `{option}` is listed twice"),
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::EmptyDistribution {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

/// Cumulative-weight inversion over raw weights. Non-positive weights are
/// never selected; `None` when nothing has positive weight.
pub fn pick_index(weights: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut running = 0.0;
    for weight in weights {
        running += weight.max(0.0);
        cumulative.push(running);
    }
    if running <= 0.0 {
        return None;
    }
    let target = draw.clamp(0.0, 1.0) * running;
    let idx = cumulative.partition_point(|c| *c <= target);
    if idx < weights.len() {
        Some(idx)
    } else {
        // draw == 1.0 after clamping; take the last positive entry
        weights.iter().rposition(|w| *w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_walks_cumulative_weights() {
        let table = WeightTable::new(vec![
            ("voice".to_string(), 3.0),
            ("text".to_string(), 1.0),
        ]);
        assert_eq!(table.pick(0.0).map(String::as_str), Some("voice"));
        assert_eq!(table.pick(0.74).map(String::as_str), Some("voice"));
        assert_eq!(table.pick(0.75).map(String::as_str), Some("text"));
        assert_eq!(table.pick(0.999).map(String::as_str), Some("text"));
    }

    #[test]
    fn zero_weights_are_never_picked() {
        assert_eq!(pick_index(&[0.0, 2.0, 0.0], 0.0), Some(1));
        assert_eq!(pick_index(&[0.0, 2.0, 0.0], 0.99), Some(1));
        assert_eq!(pick_index(&[0.0, 0.0], 0.5), None);
    }

    #[test]
    fn check_rejects_negative_and_empty_tables() {
        let negative = WeightTable::new(vec![("a".to_string(), 1.0), ("b".to_string(), -0.1)]);
        assert!(matches!(
            negative.check("attributes.channel.weights"),
            Err(ConfigError::NegativeWeight { .. })
        ));
        let empty = WeightTable::new(vec![("a".to_string(), 0.0)]);
        assert!(matches!(
            empty.check("attributes.channel.weights"),
            Err(ConfigError::EmptyDistribution { .. })
        ));
    }
}
