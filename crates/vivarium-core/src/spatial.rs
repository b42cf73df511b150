//! Uniform-grid spatial index for proximity queries.
//!
//! The grid divides the world rectangle into square cells. Each cell keeps
//! per-tag handle buckets (a `BTreeMap` so iteration order is deterministic),
//! and configured high-frequency tags additionally get a dedicated fast-lane
//! cell map that skips the per-cell tag lookup. A `handle -> (cell, tag)`
//! table makes position updates O(1).
//!
//! The grid is a pure mirror of the entity collection: membership changes
//! happen at the same call sites as `EntityManager` membership changes, and
//! a removed entity can never surface from a query.
//!
//! Edge semantics: a position exactly on a cell boundary belongs to the cell
//! of higher index (`floor(x / cell_size)`); positions outside the world
//! rectangle clamp into the nearest valid cell. Queries iterate the cells
//! intersecting the axis-aligned bounding box of the probe disk and filter
//! by squared distance. Dead entities are skipped — systems must not chase
//! the positions of entities that are mid death-animation.

use std::collections::{BTreeMap, HashMap};

use crate::entity::{kind_of, EntityHandle, Vec2};
use crate::manager::EntityManager;

type Cell = (i64, i64);

// ---------------------------------------------------------------------------
// SpatialGrid
// ---------------------------------------------------------------------------

struct FastLane {
    tag: String,
    cells: HashMap<Cell, Vec<EntityHandle>>,
}

struct Entry {
    cell: Cell,
    tag: String,
}

/// Spatial partitioning grid over `[0, width) x [0, height)`.
pub struct SpatialGrid {
    cell_size: f64,
    cols: i64,
    rows: i64,
    cells: HashMap<Cell, BTreeMap<String, Vec<EntityHandle>>>,
    fast_lanes: Vec<FastLane>,
    entries: HashMap<EntityHandle, Entry>,
}

impl SpatialGrid {
    /// Build a grid for the given world extents. `cell_size` is a positive
    /// integer number of world units.
    pub fn new(width: f64, height: f64, cell_size: u32) -> Self {
        let cs = f64::from(cell_size.max(1));
        Self {
            cell_size: cs,
            cols: ((width / cs).ceil() as i64).max(1),
            rows: ((height / cs).ceil() as i64).max(1),
            cells: HashMap::new(),
            fast_lanes: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Declare a high-frequency tag that gets a dedicated cell map. At least
    /// one fast lane per mode (the primary mobile agent) is expected.
    /// Declare lanes before any entity is indexed; existing entries are not
    /// re-bucketed.
    pub fn add_fast_lane(&mut self, tag: &str) {
        if self.fast_lanes.iter().any(|l| l.tag == tag) {
            return;
        }
        self.fast_lanes.push(FastLane {
            tag: tag.to_owned(),
            cells: HashMap::new(),
        });
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cell containing a position. Boundary positions land in the
    /// higher-index cell; out-of-bounds positions clamp.
    pub fn cell_of(&self, pos: Vec2) -> Cell {
        let col = ((pos.x / self.cell_size).floor() as i64).clamp(0, self.cols - 1);
        let row = ((pos.y / self.cell_size).floor() as i64).clamp(0, self.rows - 1);
        (col, row)
    }

    fn cell_range(&self, pos: Vec2, radius: f64) -> (i64, i64, i64, i64) {
        let cs = self.cell_size;
        let min_col = (((pos.x - radius) / cs).floor() as i64).clamp(0, self.cols - 1);
        let max_col = (((pos.x + radius) / cs).floor() as i64).clamp(0, self.cols - 1);
        let min_row = (((pos.y - radius) / cs).floor() as i64).clamp(0, self.rows - 1);
        let max_row = (((pos.y + radius) / cs).floor() as i64).clamp(0, self.rows - 1);
        (min_col, max_col, min_row, max_row)
    }

    // -- membership ----------------------------------------------------------

    /// Insert an entity at a position under a kind tag.
    pub fn add(&mut self, handle: EntityHandle, tag: &str, pos: Vec2) {
        if self.entries.contains_key(&handle) {
            self.remove(handle);
        }
        let cell = self.cell_of(pos);
        self.cells
            .entry(cell)
            .or_default()
            .entry(tag.to_owned())
            .or_default()
            .push(handle);
        if let Some(lane) = self.fast_lanes.iter_mut().find(|l| l.tag == tag) {
            lane.cells.entry(cell).or_default().push(handle);
        }
        self.entries.insert(
            handle,
            Entry {
                cell,
                tag: tag.to_owned(),
            },
        );
    }

    /// Remove an entity from the index. No-op for unknown handles.
    pub fn remove(&mut self, handle: EntityHandle) {
        let Some(entry) = self.entries.remove(&handle) else {
            return;
        };
        self.detach(handle, entry.cell, &entry.tag);
    }

    fn detach(&mut self, handle: EntityHandle, cell: Cell, tag: &str) {
        if let Some(buckets) = self.cells.get_mut(&cell) {
            if let Some(bucket) = buckets.get_mut(tag) {
                bucket.retain(|h| *h != handle);
                if bucket.is_empty() {
                    buckets.remove(tag);
                }
            }
            if buckets.is_empty() {
                self.cells.remove(&cell);
            }
        }
        if let Some(lane) = self.fast_lanes.iter_mut().find(|l| l.tag == tag) {
            if let Some(bucket) = lane.cells.get_mut(&cell) {
                bucket.retain(|h| *h != handle);
                if bucket.is_empty() {
                    lane.cells.remove(&cell);
                }
            }
        }
    }

    /// Move an entity to a new position, switching cells if needed.
    pub fn update(&mut self, handle: EntityHandle, pos: Vec2) {
        let Some(entry) = self.entries.get(&handle) else {
            return;
        };
        let new_cell = self.cell_of(pos);
        if entry.cell == new_cell {
            return;
        }
        let (old_cell, tag) = (entry.cell, entry.tag.clone());
        self.detach(handle, old_cell, &tag);
        self.cells
            .entry(new_cell)
            .or_default()
            .entry(tag.clone())
            .or_default()
            .push(handle);
        if let Some(lane) = self.fast_lanes.iter_mut().find(|l| l.tag == tag) {
            lane.cells.entry(new_cell).or_default().push(handle);
        }
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.cell = new_cell;
        }
    }

    /// Rebuild the index from scratch against the current collection.
    pub fn rebuild(&mut self, manager: &EntityManager) {
        self.cells.clear();
        self.entries.clear();
        for lane in &mut self.fast_lanes {
            lane.cells.clear();
        }
        let pending: Vec<(EntityHandle, String, Vec2)> = manager
            .iter()
            .map(|(h, e)| (h, kind_of(e).to_owned(), e.position()))
            .collect();
        for (handle, tag, pos) in pending {
            self.add(handle, &tag, pos);
        }
    }

    // -- queries -------------------------------------------------------------

    /// All living entities within Euclidean distance `radius` of `origin`,
    /// excluding `origin` itself.
    pub fn query_radius(
        &self,
        manager: &EntityManager,
        origin: EntityHandle,
        radius: f64,
    ) -> Vec<EntityHandle> {
        let Some(pos) = manager.get(origin).map(|e| e.position()) else {
            return Vec::new();
        };
        let radius_sq = radius * radius;
        let (min_col, max_col, min_row, max_row) = self.cell_range(pos, radius);

        let mut result = Vec::new();
        for col in min_col..=max_col {
            for row in min_row..=max_row {
                let Some(buckets) = self.cells.get(&(col, row)) else {
                    continue;
                };
                for bucket in buckets.values() {
                    self.collect_in_range(manager, origin, pos, radius_sq, bucket, &mut result);
                }
            }
        }
        result
    }

    /// Living entities of `tag` within `radius` of `origin`. Fast-lane tags
    /// skip the per-cell tag lookup.
    pub fn query_type(
        &self,
        manager: &EntityManager,
        origin: EntityHandle,
        radius: f64,
        tag: &str,
    ) -> Vec<EntityHandle> {
        let Some(pos) = manager.get(origin).map(|e| e.position()) else {
            return Vec::new();
        };
        let radius_sq = radius * radius;
        let (min_col, max_col, min_row, max_row) = self.cell_range(pos, radius);
        let lane = self.fast_lanes.iter().find(|l| l.tag == tag);

        let mut result = Vec::new();
        for col in min_col..=max_col {
            for row in min_row..=max_row {
                let cell = (col, row);
                let bucket = match lane {
                    Some(lane) => lane.cells.get(&cell),
                    None => self.cells.get(&cell).and_then(|b| b.get(tag)),
                };
                if let Some(bucket) = bucket {
                    self.collect_in_range(manager, origin, pos, radius_sq, bucket, &mut result);
                }
            }
        }
        result
    }

    /// The nearest living entity of `tag` within `radius`, if any.
    pub fn query_nearest_of_tag(
        &self,
        manager: &EntityManager,
        origin: EntityHandle,
        radius: f64,
        tag: &str,
    ) -> Option<EntityHandle> {
        let pos = manager.get(origin)?.position();
        let mut best: Option<(f64, EntityHandle)> = None;
        for candidate in self.query_type(manager, origin, radius, tag) {
            if let Some(other) = manager.get(candidate) {
                let d = pos.dist_sq(other.position());
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, candidate));
                }
            }
        }
        best.map(|(_, h)| h)
    }

    /// Fused multi-tag query for the common "who can I touch" check. Tags are
    /// visited in the order given, cells in row-major order within each tag's
    /// pass of a cell — the result order is deterministic.
    pub fn query_interaction_candidates(
        &self,
        manager: &EntityManager,
        origin: EntityHandle,
        radius: f64,
        tags: &[&str],
    ) -> Vec<EntityHandle> {
        let Some(pos) = manager.get(origin).map(|e| e.position()) else {
            return Vec::new();
        };
        let radius_sq = radius * radius;
        let (min_col, max_col, min_row, max_row) = self.cell_range(pos, radius);

        let mut result = Vec::new();
        for col in min_col..=max_col {
            for row in min_row..=max_row {
                let cell = (col, row);
                for tag in tags {
                    let bucket = match self.fast_lanes.iter().find(|l| l.tag == *tag) {
                        Some(lane) => lane.cells.get(&cell),
                        None => self.cells.get(&cell).and_then(|b| b.get(*tag)),
                    };
                    if let Some(bucket) = bucket {
                        self.collect_in_range(
                            manager, origin, pos, radius_sq, bucket, &mut result,
                        );
                    }
                }
            }
        }
        result
    }

    fn collect_in_range(
        &self,
        manager: &EntityManager,
        origin: EntityHandle,
        pos: Vec2,
        radius_sq: f64,
        bucket: &[EntityHandle],
        out: &mut Vec<EntityHandle>,
    ) {
        for &other in bucket {
            if other == origin {
                continue;
            }
            let Some(entity) = manager.get(other) else {
                continue;
            };
            if entity.is_dead() {
                continue;
            }
            if pos.dist_sq(entity.position()) <= radius_sq {
                out.push(other);
            }
        }
    }

    /// Debug check: every indexed handle resolves in the manager and sits in
    /// the cell its position maps to. Returns a description of the first
    /// drift found.
    pub fn check_consistency(&self, manager: &EntityManager) -> Result<(), String> {
        if self.entries.len() != manager.len() {
            return Err(format!(
                "index holds {} entities, manager holds {}",
                self.entries.len(),
                manager.len()
            ));
        }
        for (handle, entry) in &self.entries {
            let Some(entity) = manager.get(*handle) else {
                return Err(format!("index holds stale handle {handle}"));
            };
            let expected = self.cell_of(entity.position());
            if expected != entry.cell {
                return Err(format!(
                    "entity {handle} indexed in cell {:?} but positioned in {:?}",
                    entry.cell, expected
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
