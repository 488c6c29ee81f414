//! Level assembly: picks bolt points, colours them and fills baskets.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyze::{BoltDependencies, BoltRecord, extract_dependencies};
use crate::format::PointEntry;

fn default_palette() -> Vec<String> {
    ["red", "green", "blue", "yellow", "purple", "orange"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    /// Must be a positive multiple of `basket_capacity`.
    pub total_bolts: i64,
    /// Clamped to at least one and at most the basket count.
    pub total_colors: i64,
    /// Fixed seed for a reproducible level.
    pub seed: Option<u64>,
    /// Material per colour index.
    pub palette: Vec<String>,
    /// Only place bolts on points nothing blocks.
    pub skip_blocked_points: bool,
    pub basket_capacity: usize,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            total_bolts: 12,
            total_colors: 6,
            seed: None,
            palette: default_palette(),
            skip_blocked_points: true,
            basket_capacity: 3,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("total bolts must be a positive multiple of {capacity}, got {total}")]
    BoltCount { total: i64, capacity: usize },
    #[error("the point file contains no points")]
    NoPoints,
    #[error("not enough usable points: need {needed}, have {available}")]
    NotEnoughPoints { needed: usize, available: usize },
    #[error("not enough palette entries: need {needed}, have {available}")]
    NotEnoughColors { needed: usize, available: usize },
}

pub type LevelResult<T> = Result<T, LevelError>;

/// A basket before it is filled in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketPlan {
    /// `Color_{index}`.
    pub color_name: String,
    pub color_index: usize,
    pub basket_index: usize,
    pub bolt_point_ids: Vec<String>,
}

/// A coloured bolt placed on a generated point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBolt {
    /// `Bolt_{point}_B{basket}C{colour}`.
    pub id: String,
    pub point_id: String,
    pub basket_index: usize,
    pub color_index: usize,
    /// Palette entry of the colour.
    pub material: String,
    pub mesh: String,
    pub blocked_by: Option<String>,
    pub depth: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub baskets: Vec<BasketPlan>,
    pub bolts: Vec<LevelBolt>,
}

impl Level {
    #[must_use]
    pub fn bolt_records(&self) -> Vec<BoltRecord> {
        self.bolts
            .iter()
            .map(|b| BoltRecord {
                bolt_id: b.id.clone(),
                color_id: i32::try_from(b.color_index).unwrap_or(i32::MAX),
                depth: b.depth,
                mesh: b.mesh.clone(),
                blocked_by: b.blocked_by.clone(),
            })
            .collect()
    }

    /// Parents and pawns of every bolt, in bolt order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<BoltDependencies> {
        extract_dependencies(&self.bolt_records())
    }
}

/// Builds a level with the settings' seed, or OS entropy without one.
pub fn build_level(points: &[PointEntry], settings: &LevelSettings) -> LevelResult<Level> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    build_level_with_rng(points, settings, &mut rng)
}

pub fn build_level_with_rng<R: Rng>(
    points: &[PointEntry],
    settings: &LevelSettings,
    rng: &mut R,
) -> LevelResult<Level> {
    let capacity = settings.basket_capacity.max(1);
    let total = usize::try_from(settings.total_bolts)
        .ok()
        .filter(|&t| t > 0 && t % capacity == 0)
        .ok_or_else(|| {
            log::error!("total bolts {} is not a positive multiple of {capacity}", settings.total_bolts);
            LevelError::BoltCount {
                total: settings.total_bolts,
                capacity,
            }
        })?;

    if points.is_empty() {
        log::error!("no points to place bolts on");
        return Err(LevelError::NoPoints);
    }

    let usable = usable_points(points, settings.skip_blocked_points);
    if usable.len() < total {
        log::error!("need {total} usable points, have {}", usable.len());
        return Err(LevelError::NotEnoughPoints {
            needed: total,
            available: usable.len(),
        });
    }

    let basket_count = total / capacity;
    let requested = usize::try_from(settings.total_colors.max(1)).unwrap_or(1);
    let colors = if requested > basket_count {
        log::warn!("{requested} colours for {basket_count} baskets; using {basket_count}");
        basket_count
    } else {
        requested
    };
    if settings.palette.len() < colors {
        log::error!("need {colors} palette entries, have {}", settings.palette.len());
        return Err(LevelError::NotEnoughColors {
            needed: colors,
            available: settings.palette.len(),
        });
    }

    let mut baskets = plan_baskets(basket_count, colors);

    let mut shuffled = usable;
    shuffled.shuffle(rng);
    shuffled.truncate(total);

    let mut bolts = Vec::with_capacity(total);
    for (i, point) in shuffled.into_iter().enumerate() {
        let basket = &mut baskets[i / capacity];
        bolts.push(LevelBolt {
            id: format!("Bolt_{}_B{}C{}", point.id, basket.basket_index, basket.color_index),
            point_id: point.id.clone(),
            basket_index: basket.basket_index,
            color_index: basket.color_index,
            material: settings.palette[basket.color_index].clone(),
            mesh: point.parent_mesh_id.clone(),
            blocked_by: point.blocked_by().map(str::to_owned),
            depth: point.depth,
        });
        basket.bolt_point_ids.push(point.id.clone());
    }

    log::info!("level with {} bolts in {basket_count} baskets of {colors} colours", bolts.len());
    Ok(Level { baskets, bolts })
}

fn usable_points(points: &[PointEntry], skip_blocked: bool) -> Vec<&PointEntry> {
    let mut seen = HashSet::new();
    let mut usable = Vec::with_capacity(points.len());
    for point in points {
        if skip_blocked && point.blocked_by().is_some() {
            continue;
        }
        if !seen.insert(point.id.as_str()) {
            log::warn!("duplicate point id '{}' skipped", point.id);
            continue;
        }
        usable.push(point);
    }
    usable
}

/// Even split of baskets over colours, remainder to the first colours.
fn plan_baskets(basket_count: usize, colors: usize) -> Vec<BasketPlan> {
    let base = basket_count / colors;
    let remainder = basket_count % colors;
    let mut baskets = Vec::with_capacity(basket_count);
    for color_index in 0..colors {
        let count = base + usize::from(color_index < remainder);
        for _ in 0..count {
            baskets.push(BasketPlan {
                color_name: format!("Color_{color_index}"),
                color_index,
                basket_index: baskets.len(),
                bolt_point_ids: Vec::new(),
            });
        }
    }
    baskets
}
