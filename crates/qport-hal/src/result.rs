//! Measurement outcomes and shot counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use qport_compile::PostprocessCircuit;

use crate::error::HalError;

/// One readout: the value of each measured bit, in readout order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Outcome(Vec<bool>);

impl Outcome {
    /// Create an outcome from bit values.
    pub fn new(bits: impl IntoIterator<Item = bool>) -> Self {
        Self(bits.into_iter().collect())
    }

    /// An all-zero outcome of the given width.
    pub fn zeros(width: usize) -> Self {
        Self(vec![false; width])
    }

    /// Decode `value` as `width` bits.
    ///
    /// With `big_endian` the most significant bit lands at position 0,
    /// otherwise position 0 holds the least significant bit.
    pub fn from_int(value: u64, width: usize, big_endian: bool) -> Self {
        let bit = |shift: usize| {
            u32::try_from(shift)
                .ok()
                .and_then(|s| value.checked_shr(s))
                .is_some_and(|v| v & 1 == 1)
        };
        Self(
            (0..width)
                .map(|i| bit(if big_endian { width - 1 - i } else { i }))
                .collect(),
        )
    }

    /// Encode as an integer. Bits past 64 are dropped.
    pub fn to_int(&self, big_endian: bool) -> u64 {
        let width = self.0.len();
        self.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| if big_endian { width - 1 - i } else { i })
            .filter(|&shift| shift < 64)
            .fold(0, |acc, shift| acc | (1 << shift))
    }

    /// Reorder: position `i` of the result is position `indices[i]` of `self`.
    ///
    /// Indices past the end read as 0.
    #[must_use]
    pub fn choose_indices(&self, indices: &[usize]) -> Self {
        Self(
            indices
                .iter()
                .map(|&i| self.0.get(i).copied().unwrap_or(false))
                .collect(),
        )
    }

    /// Bit values.
    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether this is a zero-width readout.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.to_string()
    }
}

impl TryFrom<String> for Outcome {
    type Error = HalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::str::FromStr for Outcome {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(HalError::Backend(format!(
                    "invalid character '{other}' in outcome '{s}'"
                ))),
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

/// Number of shots observed per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<Outcome, u64>);

impl Counts {
    /// Empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` observations of `outcome`.
    pub fn insert(&mut self, outcome: Outcome, count: u64) {
        *self.0.entry(outcome).or_insert(0) += count;
    }

    /// Count for an outcome (0 if never seen).
    pub fn get(&self, outcome: &Outcome) -> u64 {
        self.0.get(outcome).copied().unwrap_or(0)
    }

    /// Total number of shots.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Outcome with the highest count. Ties go to the smallest outcome.
    pub fn most_frequent(&self) -> Option<(&Outcome, u64)> {
        self.0
            .iter()
            .fold(None, |best: Option<(&Outcome, u64)>, (o, &c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((o, c)),
            })
    }

    /// Iterate over outcomes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Outcome, u64)> {
        self.0.iter().map(|(o, &c)| (o, c))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Outcome, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (Outcome, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (o, c) in iter {
            counts.insert(o, c);
        }
        counts
    }
}

/// Result of running one circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendResult {
    /// Raw counts as returned by the device.
    pub counts: Counts,
    /// Corrections still to be applied to the raw counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppcirc: Option<PostprocessCircuit>,
}

impl BackendResult {
    /// Result without postprocessing.
    pub fn from_counts(counts: Counts) -> Self {
        Self {
            counts,
            ppcirc: None,
        }
    }

    /// Attach a postprocessing correction.
    #[must_use]
    pub fn with_ppcirc(mut self, ppcirc: Option<PostprocessCircuit>) -> Self {
        self.ppcirc = ppcirc;
        self
    }

    /// Counts with postprocessing applied.
    pub fn get_counts(&self) -> Counts {
        match &self.ppcirc {
            Some(pp) if !pp.is_empty() => self
                .counts
                .iter()
                .map(|(o, c)| (Outcome::new(pp.apply(o.bits())), c))
                .collect(),
            _ => self.counts.clone(),
        }
    }

    /// Number of shots.
    pub fn n_shots(&self) -> u64 {
        self.counts.total()
    }
}
