//! Grouped mean reduction with a fixed floating-point summation order.

use serde::{Deserialize, Serialize};

// ── MeanAccumulator ───────────────────────────────────────────────────────────

/// Running sum and count of ratings for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanAccumulator {
    pub sum: f64,
    pub count: usize,
}

impl MeanAccumulator {
    /// Add a single rating to the running totals.
    pub fn add(&mut self, rating: f64) {
        self.sum += rating;
        self.count += 1;
    }

    /// Mean of the accumulated ratings, `None` when nothing was added.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

// ── GroupedMeans ──────────────────────────────────────────────────────────────

/// Stateless helper that reduces `(key, rating)` samples to per-key means.
pub struct GroupedMeans;

impl GroupedMeans {
    /// Reduce `samples` to one accumulator per distinct key, ascending by key.
    ///
    /// Samples are stable-sorted by key first and summed in that order, so
    /// samples sharing a key are added in their original relative order. Two
    /// calls with the same input produce bit-identical sums.
    pub fn reduce<K: Ord>(mut samples: Vec<(K, f64)>) -> Vec<(K, MeanAccumulator)> {
        samples.sort_by(|a, b| a.0.cmp(&b.0));

        let mut groups: Vec<(K, MeanAccumulator)> = Vec::new();
        for (key, rating) in samples {
            let continues_run = matches!(groups.last(), Some((last_key, _)) if *last_key == key);
            if continues_run {
                if let Some((_, acc)) = groups.last_mut() {
                    acc.add(rating);
                }
            } else {
                let mut acc = MeanAccumulator::default();
                acc.add(rating);
                groups.push((key, acc));
            }
        }
        groups
    }

    /// Look up `key` in groups produced by [`GroupedMeans::reduce`].
    pub fn find<'a, K: Ord>(
        groups: &'a [(K, MeanAccumulator)],
        key: &K,
    ) -> Option<&'a MeanAccumulator> {
        groups
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|idx| &groups[idx].1)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
