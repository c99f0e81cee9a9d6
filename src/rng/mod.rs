//! Keyed pseudo-random streams.
//!
//! Every stream is a pure function of the run seed and a [`StreamKey`]:
//! the key is hashed together with the seed and the digest seeds a fresh
//! `StdRng`. Nothing is shared between keys, so the values drawn for one
//! dimension (say, the agent picked for call 42) never depend on how many
//! values another dimension consumed.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const STREAM_DOMAIN: &[u8] = b"callsynth.stream.v1";

/// Top-level run seed. Integers and free-form strings are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl Seed {
    fn encode(&self, hasher: &mut Sha256) {
        match self {
            Seed::Int(value) => {
                hasher.update([0x01]);
                hasher.update(value.to_be_bytes());
            }
            Seed::Text(value) => {
                hasher.update([0x02]);
                hasher.update((value.len() as u64).to_be_bytes());
                hasher.update(value.as_bytes());
            }
        }
    }
}

impl FromStr for Seed {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u64>() {
            Ok(value) => Seed::Int(value),
            Err(_) => Seed::Text(s.to_string()),
        })
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Int(value) => write!(f, "{value}"),
            Seed::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Int(value)
    }
}

/// Generation dimension a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Outage,
    Shift,
    Identity,
    Attribute,
    Metric,
    Customer,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Outage => "outage",
            Dimension::Shift => "shift",
            Dimension::Identity => "identity",
            Dimension::Attribute => "attribute",
            Dimension::Metric => "metric",
            Dimension::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPart {
    Index(u64),
    Label(String),
}

/// Stable address of a stream: a dimension plus ordered labels and loop
/// indices (day, call within day, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamKey {
    dimension: Dimension,
    parts: Vec<KeyPart>,
}

impl StreamKey {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            parts: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.parts.push(KeyPart::Label(label.into()));
        self
    }

    pub fn index(mut self, index: u64) -> Self {
        self.parts.push(KeyPart::Index(index));
        self
    }

    fn encode(&self, hasher: &mut Sha256) {
        let dim = self.dimension.as_str().as_bytes();
        hasher.update((dim.len() as u32).to_be_bytes());
        hasher.update(dim);
        for part in &self.parts {
            match part {
                KeyPart::Index(value) => {
                    hasher.update([0x10]);
                    hasher.update(value.to_be_bytes());
                }
                KeyPart::Label(value) => {
                    hasher.update([0x20]);
                    hasher.update((value.len() as u32).to_be_bytes());
                    hasher.update(value.as_bytes());
                }
            }
        }
    }
}

/// Derives independent streams from one seed. Cheap to clone and safe to
/// share across worker threads; it holds no generator state.
#[derive(Debug, Clone)]
pub struct StreamFactory {
    seed: Seed,
}

impl StreamFactory {
    pub fn new(seed: Seed) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn stream(&self, key: &StreamKey) -> KeyedStream {
        let mut hasher = Sha256::new();
        hasher.update(STREAM_DOMAIN);
        self.seed.encode(&mut hasher);
        key.encode(&mut hasher);
        let digest: [u8; 32] = hasher.finalize().into();
        KeyedStream {
            rng: StdRng::from_seed(digest),
        }
    }
}

/// One reproducible sequence of draws.
pub struct KeyedStream {
    rng: StdRng,
}

impl KeyedStream {
    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.unit()
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability.clamp(0.0, 1.0)
    }

    /// Uniform index in `0..n`. `n` must be positive.
    pub fn below(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Standard normal via Box-Muller.
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = 1.0 - self.unit();
        let u2 = self.unit();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    pub fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        if sigma <= 0.0 {
            return mean;
        }
        mean + sigma * self.standard_normal()
    }

    /// Normal draw restricted to `[min, max]`: rejection for a bounded
    /// number of tries, then a clamp.
    pub fn truncated_normal(&mut self, mean: f64, sigma: f64, min: f64, max: f64) -> f64 {
        const MAX_TRIES: usize = 16;
        let mut value = mean;
        for _ in 0..MAX_TRIES {
            value = self.normal(mean, sigma);
            if (min..=max).contains(&value) {
                return value;
            }
        }
        value.clamp(min, max)
    }

    pub fn bytes16(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}
