//! Bolt dependencies, play ordering and same-colour triple grouping.
//!
//! `parents` of a bolt are the bolts blocked by the bolt's own mesh: removing
//! that mesh frees them. `pawns` are the bolts sitting on the mesh that blocks
//! the bolt.

use std::collections::HashMap;

use thiserror::Error;

use crate::metrics::{GenerationMetrics, Phase, TimingReport};

/// A bolt as seen by the extractor: where it sits and what blocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltRecord {
    pub bolt_id: String,
    pub color_id: i32,
    pub depth: i32,
    pub mesh: String,
    pub blocked_by: Option<String>,
}

/// A bolt with its derived adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltDependencies {
    pub bolt_id: String,
    pub color_id: i32,
    pub depth: i32,
    pub parents: Vec<String>,
    pub pawns: Vec<String>,
}

/// Derives parents and pawns for every bolt, keeping input order.
#[must_use]
pub fn extract_dependencies(bolts: &[BoltRecord]) -> Vec<BoltDependencies> {
    let mut on_mesh: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut blocked_by_mesh: HashMap<&str, Vec<&str>> = HashMap::new();
    for bolt in bolts {
        on_mesh.entry(bolt.mesh.as_str()).or_default().push(&bolt.bolt_id);
        if let Some(blocker) = bolt.blocked_by.as_deref() {
            blocked_by_mesh.entry(blocker).or_default().push(&bolt.bolt_id);
        }
    }

    let owned = |ids: Option<&Vec<&str>>| -> Vec<String> {
        ids.map(|ids| ids.iter().map(|&s| s.to_owned()).collect())
            .unwrap_or_default()
    };

    bolts
        .iter()
        .map(|bolt| BoltDependencies {
            bolt_id: bolt.bolt_id.clone(),
            color_id: bolt.color_id,
            depth: bolt.depth,
            parents: owned(blocked_by_mesh.get(bolt.mesh.as_str())),
            pawns: owned(bolt.blocked_by.as_deref().and_then(|m| on_mesh.get(m))),
        })
        .collect()
}

/// Stable sort: depth ascending, parent count ascending, pawn count descending.
pub fn order_bolts(bolts: &mut [BoltDependencies]) {
    bolts.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then(a.parents.len().cmp(&b.parents.len()))
            .then(b.pawns.len().cmp(&a.pawns.len()))
    });
}

/// Same-colour group of bolts destined for one basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub color_id: i32,
    pub bolts: Vec<BoltDependencies>,
}

impl Triple {
    #[must_use]
    pub fn depth_sum(&self) -> i64 {
        self.bolts.iter().map(|b| i64::from(b.depth)).sum()
    }

    /// Mean absolute deviation of the member depths.
    #[must_use]
    pub fn depth_spread(&self) -> f64 {
        if self.bolts.is_empty() {
            return 0.0;
        }
        let n = self.bolts.len() as f64;
        let mean = self.depth_sum() as f64 / n;
        self.bolts
            .iter()
            .map(|b| (f64::from(b.depth) - mean).abs())
            .sum::<f64>()
            / n
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.bolts.iter().map(|b| b.bolt_id.as_str())
    }
}

/// Groups an ordered sequence greedily into same-colour groups of `size`.
///
/// The head of the remaining sequence picks the colour; the first `size`
/// bolts of that colour form a group. A colour that cannot fill a group is
/// dropped entirely. Returns the groups and the dropped bolt ids.
#[must_use]
pub fn group_triples(ordered: &[BoltDependencies], size: usize) -> (Vec<Triple>, Vec<String>) {
    let mut remaining: Vec<&BoltDependencies> = ordered.iter().collect();
    let mut triples = Vec::new();
    let mut dropped = Vec::new();

    while let Some(first) = remaining.first() {
        let color = first.color_id;
        let same: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, b)| b.color_id == color)
            .map(|(i, _)| i)
            .take(size)
            .collect();

        if same.len() == size {
            let bolts = same.iter().map(|&i| remaining[i].clone()).collect();
            triples.push(Triple { color_id: color, bolts });
            // Indices are ascending; remove back to front.
            for &i in same.iter().rev() {
                remaining.remove(i);
            }
        } else {
            remaining.retain(|b| {
                if b.color_id == color {
                    dropped.push(b.bolt_id.clone());
                    false
                } else {
                    true
                }
            });
            log::warn!("colour {color} cannot fill a group of {size}; its bolts are left out");
        }
    }
    (triples, dropped)
}

/// Orders groups by summed depth, then by depth spread. Stable.
pub fn order_triples(triples: &mut [Triple]) {
    triples.sort_by(|a, b| {
        a.depth_sum()
            .cmp(&b.depth_sum())
            .then(a.depth_spread().total_cmp(&b.depth_spread()))
    });
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("no bolts to analyze")]
    Empty,
    #[error("group size must be positive")]
    InvalidGroupSize,
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub ordered: Vec<BoltDependencies>,
    /// Basket order.
    pub triples: Vec<Triple>,
    pub dropped: Vec<String>,
    pub timing: Option<TimingReport>,
}

/// Sorts bolts, groups them and orders the groups.
#[derive(Debug)]
pub struct Analyzer {
    group_size: usize,
    metrics: GenerationMetrics,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Analyzer {
    #[must_use]
    pub fn new(group_size: usize) -> Self {
        Self {
            group_size,
            metrics: GenerationMetrics::default(),
        }
    }

    pub fn run(&mut self, bolts: Vec<BoltDependencies>) -> AnalyzeResult<Analysis> {
        if self.group_size == 0 {
            return Err(AnalyzeError::InvalidGroupSize);
        }
        if bolts.is_empty() {
            log::error!("bolt list is empty");
            return Err(AnalyzeError::Empty);
        }

        self.metrics.begin();
        let size = self.group_size;
        let (ordered, triples, dropped) = self.metrics.time(Phase::Analysis, || {
            let mut ordered = bolts;
            order_bolts(&mut ordered);
            let (mut triples, dropped) = group_triples(&ordered, size);
            order_triples(&mut triples);
            (ordered, triples, dropped)
        });

        for b in &ordered {
            log::debug!(
                "bolt {} | depth={}, parents={}, pawns={}",
                b.bolt_id,
                b.depth,
                b.parents.len(),
                b.pawns.len()
            );
        }
        log::info!(
            "{} bolts ordered into {} groups, {} left out",
            ordered.len(),
            triples.len(),
            dropped.len()
        );

        Ok(Analysis {
            ordered,
            triples,
            dropped,
            timing: self.metrics.end(),
        })
    }
}
