use std::collections::HashSet;

use geo::Intersects;
use geo_types::{Geometry, Polygon, Rect, coord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub type Properties = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// `[min_x, min_y, max_x, max_y]` in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport(pub [f64; 4]);

impl Viewport {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Viewport([min_x, min_y, max_x, max_y])
    }

    pub fn min_x(&self) -> f64 {
        self.0[0]
    }

    pub fn min_y(&self) -> f64 {
        self.0[1]
    }

    pub fn max_x(&self) -> f64 {
        self.0[2]
    }

    pub fn max_y(&self) -> f64 {
        self.0[3]
    }

    pub fn contains(&self, bbox: &TileBBox) -> bool {
        bbox.west >= self.min_x()
            && bbox.east <= self.max_x()
            && bbox.north <= self.max_y()
            && bbox.south >= self.min_y()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    fn unique_key(&self, unique_id: &str) -> String {
        // Missing ids all collapse onto the `null` key.
        self.properties
            .get(unique_id)
            .unwrap_or(&Value::Null)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub bbox: TileBBox,
    pub data: Vec<Feature>,
    pub is_visible: bool,
    pub full_visible: bool,
}

impl Tile {
    pub fn new(bbox: TileBBox, data: Vec<Feature>) -> Self {
        Self {
            bbox,
            data,
            is_visible: true,
            full_visible: false,
        }
    }
}

pub fn prepare_viewport(bbox: &TileBBox, viewport: &Viewport) -> Option<Rect<f64>> {
    let min_x = bbox.west.max(viewport.min_x());
    let min_y = bbox.south.max(viewport.min_y());
    let max_x = bbox.east.min(viewport.max_x());
    let max_y = bbox.north.min(viewport.max_y());
    if min_x > max_x || min_y > max_y {
        return None;
    }

    let width = bbox.east - bbox.west;
    let height = bbox.south - bbox.north;
    if width == 0.0 || height == 0.0 || !width.is_finite() || !height.is_finite() {
        return None;
    }

    let t_min_x = (min_x - bbox.west) / width;
    let t_max_x = (max_x - bbox.west) / width;
    let t_min_y = (min_y - bbox.north) / height;
    let t_max_y = (max_y - bbox.north) / height;
    Some(Rect::new(
        coord! { x: t_min_x, y: t_min_y },
        coord! { x: t_max_x, y: t_max_y },
    ))
}

struct FeatureIndex<'a> {
    seen: HashSet<String>,
    out: Vec<&'a Properties>,
}

impl<'a> FeatureIndex<'a> {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    fn insert(&mut self, key: String, properties: &'a Properties) {
        if self.seen.insert(key) {
            self.out.push(properties);
        }
    }
}

fn add_intersected_features<'a>(
    index: &mut FeatureIndex<'a>,
    tile: &'a Tile,
    viewport: &Viewport,
    unique_id: &str,
) {
    let Some(clip) = prepare_viewport(&tile.bbox, viewport) else {
        return;
    };
    let polygon: Polygon<f64> = clip.to_polygon();

    let candidates: Vec<(String, &Feature)> = tile
        .data
        .iter()
        .map(|feature| (feature.unique_key(unique_id), feature))
        .filter(|(key, _)| !index.contains(key))
        .collect();

    let hits: Vec<bool> = candidates
        .par_iter()
        .map(|(_, feature)| {
            feature
                .geometry
                .as_ref()
                .is_some_and(|geometry| geometry.intersects(&polygon))
        })
        .collect();

    for ((key, feature), hit) in candidates.into_iter().zip(hits) {
        if hit {
            index.insert(key, &feature.properties);
        }
    }
}

pub fn viewport_features(
    tiles: &mut [Tile],
    viewport: &Viewport,
    unique_id: &str,
) -> Vec<Properties> {
    for tile in tiles.iter_mut() {
        if tile.is_visible {
            tile.full_visible = viewport.contains(&tile.bbox);
        }
    }

    let mut index = FeatureIndex::new();
    for tile in tiles.iter() {
        if !tile.is_visible {
            continue;
        }
        if tile.full_visible {
            for feature in tile.data.iter() {
                let key = feature.unique_key(unique_id);
                index.insert(key, &feature.properties);
            }
        } else {
            add_intersected_features(&mut index, tile, viewport, unique_id);
        }
    }

    debug!(
        tiles = tiles.len(),
        features = index.out.len(),
        "resolved viewport features"
    );
    index.out.into_iter().cloned().collect()
}
