//! Uniform-grid spatial index for proximity queries.
//!
//! Entries are bucketed by the cell containing their centre. Queries widen the
//! scanned cell range by the largest indexed radius so that big colliders
//! straddling a cell border are still found. Query results never depend on
//! hash-map iteration order: they are sorted by distance, then by id.

use std::collections::HashMap;

use glam::Vec2;

use skirmish_core::types::EntityId;

type Cell = (i32, i32);

#[derive(Debug, Clone, Copy)]
struct Entry {
    position: Vec2,
    radius: f32,
    groups: u32,
    cell: Cell,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<Cell, Vec<EntityId>>,
    entries: HashMap<EntityId, Entry>,
    max_radius: f32,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            entries: HashMap::new(),
            max_radius: 0.0,
        }
    }

    fn cell_of(&self, position: Vec2) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Insert or move an entry.
    pub fn insert(&mut self, id: EntityId, position: Vec2, radius: f32, groups: u32) {
        self.remove(id);
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(id);
        self.entries.insert(
            id,
            Entry {
                position,
                radius,
                groups,
                cell,
            },
        );
        self.max_radius = self.max_radius.max(radius);
    }

    pub fn remove(&mut self, id: EntityId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        if let Some(bucket) = self.cells.get_mut(&entry.cell) {
            bucket.retain(|other| *other != id);
            if bucket.is_empty() {
                self.cells.remove(&entry.cell);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.max_radius = 0.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in any of `groups` whose collider overlaps the query circle,
    /// nearest centre first, ties broken by id.
    pub fn query(&self, position: Vec2, radius: f32, groups: u32) -> Vec<EntityId> {
        let reach = radius + self.max_radius;
        let (min_x, min_y) = self.cell_of(position - Vec2::splat(reach));
        let (max_x, max_y) = self.cell_of(position + Vec2::splat(reach));

        let mut hits: Vec<(f32, EntityId)> = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for id in bucket {
                    let Some(entry) = self.entries.get(id) else {
                        continue;
                    };
                    if entry.groups & groups == 0 {
                        continue;
                    }
                    let dist_sq = entry.position.distance_squared(position);
                    let limit = radius + entry.radius;
                    if dist_sq <= limit * limit {
                        hits.push((dist_sq, *id));
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_nearest_first() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(EntityId(1), Vec2::new(100.0, 0.0), 1.0, 1);
        grid.insert(EntityId(2), Vec2::new(10.0, 0.0), 1.0, 1);
        grid.insert(EntityId(3), Vec2::new(-50.0, 0.0), 1.0, 1);
        grid.insert(EntityId(4), Vec2::new(1000.0, 0.0), 1.0, 1);

        let hits = grid.query(Vec2::ZERO, 200.0, 1);
        assert_eq!(hits, vec![EntityId(2), EntityId(3), EntityId(1)]);
    }

    #[test]
    fn test_equal_distance_breaks_on_id() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(EntityId(9), Vec2::new(0.0, 30.0), 1.0, 1);
        grid.insert(EntityId(5), Vec2::new(0.0, -30.0), 1.0, 1);
        assert_eq!(grid.query(Vec2::ZERO, 50.0, 1), vec![EntityId(5), EntityId(9)]);
    }

    #[test]
    fn test_group_mask_filters() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(EntityId(1), Vec2::ZERO, 1.0, 0b01);
        grid.insert(EntityId(2), Vec2::ZERO, 1.0, 0b10);
        assert_eq!(grid.query(Vec2::ZERO, 5.0, 0b10), vec![EntityId(2)]);
        assert_eq!(grid.query(Vec2::ZERO, 5.0, 0b11).len(), 2);
    }

    #[test]
    fn test_large_collider_across_cells() {
        let mut grid = SpatialGrid::new(32.0);
        // Centre is several cells away but the collider reaches the origin.
        grid.insert(EntityId(1), Vec2::new(150.0, 0.0), 149.0, 1);
        assert_eq!(grid.query(Vec2::ZERO, 2.0, 1), vec![EntityId(1)]);
    }

    #[test]
    fn test_reinsert_moves_entry() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(EntityId(1), Vec2::ZERO, 1.0, 1);
        grid.insert(EntityId(1), Vec2::new(500.0, 500.0), 1.0, 1);
        assert_eq!(grid.len(), 1);
        assert!(grid.query(Vec2::ZERO, 10.0, 1).is_empty());
        assert_eq!(grid.query(Vec2::new(500.0, 500.0), 10.0, 1), vec![EntityId(1)]);

        grid.remove(EntityId(1));
        assert!(grid.is_empty());
        grid.remove(EntityId(1));
    }
}
