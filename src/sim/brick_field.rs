//! Procedural brick packing
//!
//! Bricks are dropped at random positions and kept only if their
//! margin-expanded bounds stay clear of every occupied rectangle. The search
//! is bounded, so a field can end up sparser than geometrically possible.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::*;

/// Source dimensions of one sprite family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectInfo {
    /// width / height
    pub aspect_ratio: f32,
    pub original_width: f32,
    pub original_height: f32,
}

impl AspectInfo {
    pub fn from_dimensions(width: f32, height: f32) -> Self {
        Self {
            aspect_ratio: if height > 0.0 { width / height } else { 1.0 },
            original_width: width,
            original_height: height,
        }
    }
}

/// Sprite family -> source dimensions
///
/// Ordered so seeded runs pick the same family for the same roll.
pub type AspectCatalog = BTreeMap<String, AspectInfo>;

/// Brick sprite families shipped with the game (source pixel sizes)
pub fn default_brick_catalog() -> AspectCatalog {
    [
        ("stone", 192.0, 64.0),
        ("glass", 256.0, 64.0),
        ("crate", 128.0, 128.0),
        ("neon", 320.0, 80.0),
        ("circuit", 144.0, 96.0),
    ]
    .into_iter()
    .map(|(name, w, h)| (name.to_string(), AspectInfo::from_dimensions(w, h)))
    .collect()
}

/// A successful placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub rect: Rect,
    pub family: String,
    /// Logical height drawn from the size distribution
    pub size: f32,
    /// Nearest height we have a texture for
    pub asset_size: u32,
}

impl Placement {
    /// Texture key, e.g. `stone-24`
    pub fn texture(&self) -> String {
        format!("{}-{}", self.family, self.asset_size)
    }
}

/// Round a logical size to the nearest shipped asset size (ties go down)
pub fn nearest_asset_size(size: f32) -> u32 {
    let mut best = BRICK_ASSET_SIZES[0];
    for candidate in BRICK_ASSET_SIZES {
        if (candidate as f32 - size).abs() < (best as f32 - size).abs() {
            best = candidate;
        }
    }
    best
}

/// Occupancy tracker and packer for the brick area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickField {
    bounds: Rect,
    margin: f32,
    /// (family, info), flattened from the catalog for indexed picks
    families: Vec<(String, AspectInfo)>,
    occupied: Vec<Rect>,
}

impl Default for BrickField {
    fn default() -> Self {
        Self::new(Rect::new(
            BRICK_AREA_X,
            BRICK_AREA_Y,
            BRICK_AREA_WIDTH,
            BRICK_AREA_HEIGHT,
        ))
    }
}

impl BrickField {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            margin: BRICK_MARGIN,
            families: Vec::new(),
            occupied: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Record per-family aspect ratios from source asset dimensions
    pub fn initialize_aspect_ratios(&mut self, catalog: &AspectCatalog) {
        self.families = catalog
            .iter()
            .filter(|(_, info)| info.aspect_ratio.is_finite() && info.aspect_ratio > 0.0)
            .map(|(name, info)| (name.clone(), *info))
            .collect();
        log::debug!("Brick catalog loaded: {} families", self.families.len());
    }

    pub fn occupied(&self) -> &[Rect] {
        &self.occupied
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Fill the field, giving up after the attempt budget or a run of misses
    pub fn pack_initial<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Placement> {
        let mut placed = Vec::new();
        let mut consecutive_failures = 0;

        for _ in 0..PACK_MAX_ATTEMPTS {
            match self.try_place(rng) {
                Some(placement) => {
                    consecutive_failures = 0;
                    placed.push(placement);
                }
                None => {
                    consecutive_failures += 1;
                    if consecutive_failures >= PACK_MAX_CONSECUTIVE_FAILURES {
                        break;
                    }
                }
            }
        }

        log::info!(
            "Packed {} bricks ({} occupied total)",
            placed.len(),
            self.occupied.len()
        );
        placed
    }

    /// Try to squeeze in one more brick; `None` when the field looks full
    pub fn add_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Placement> {
        (0..ADD_ONE_MAX_ATTEMPTS).find_map(|_| self.try_place(rng))
    }

    /// Replace occupancy with the rectangles of bricks that are still alive
    pub fn rebuild_occupancy<I: IntoIterator<Item = Rect>>(&mut self, live: I) {
        self.occupied = live.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
    }

    /// True if `rect` keeps the margin to every occupied rectangle
    pub fn is_free(&self, rect: &Rect) -> bool {
        let padded = rect.expanded(self.margin);
        !self.occupied.iter().any(|o| padded.intersects(o))
    }

    fn try_place<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Placement> {
        if self.families.is_empty() {
            return None;
        }

        let (family, info) = &self.families[rng.random_range(0..self.families.len())];
        let size = pick_weighted_size(rng);
        let height = size;
        let width = size * info.aspect_ratio;

        let slack_x = self.bounds.width - width;
        let slack_y = self.bounds.height - height;
        if slack_x < 0.0 || slack_y < 0.0 {
            return None;
        }

        let rect = Rect::new(
            self.bounds.x + rng.random::<f32>() * slack_x,
            self.bounds.y + rng.random::<f32>() * slack_y,
            width,
            height,
        );
        if !self.is_free(&rect) {
            return None;
        }

        self.occupied.push(rect);
        Some(Placement {
            rect,
            family: family.clone(),
            size,
            asset_size: nearest_asset_size(size),
        })
    }
}

/// Draw a logical brick size from the weighted buckets
fn pick_weighted_size<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let total: u32 = BRICK_SIZE_WEIGHTS.iter().sum();
    let mut roll = rng.random_range(0..total);
    for (size, weight) in BRICK_SIZES.iter().zip(BRICK_SIZE_WEIGHTS) {
        if roll < weight {
            return *size;
        }
        roll -= weight;
    }
    BRICK_SIZES[0]
}
