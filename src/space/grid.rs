//! Spatial Grid
//!
//! Space is cut into fixed-size cells. Each cell holds, per role, the set
//! of hitboxes whose bounding box touches it. Cells exist only while they
//! hold something, and the grid tracks the min/max coordinates of existing
//! cells so queries can skip empty space.
//!
//! ```text
//!   cell (i, j) covers [i*w, (i+1)*w] x [j*h, (j+1)*h]
//!
//!   inclusive range  ceil(l/w)-1 ..= floor(r/w)        every cell the box touches
//!   exclusive range  floor(l/w) ..= max(lo, ceil(r/w)-1)  cells the box's interior crosses
//! ```
//!
//! A hitbox is registered under its inclusive range and queries scan the
//! exclusive range; two boxes that merely touch always share a cell that
//! way.
//!
//! All mutation of cell contents happens here. The rest of the crate only
//! calls the role operations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};
use slotmap::SlotMap;
use tracing::debug;

use crate::core::fixed::{Fixed, ceil_div, floor_div};
use crate::geom::BoundingBox;
use super::hitbox::{Hitbox, HitboxId, Role};

// =============================================================================
// COORDINATES AND RANGES
// =============================================================================

/// Integer cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl CellCoord {
    /// Create coordinates.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// First column
    pub min_x: i32,
    /// First row
    pub min_y: i32,
    /// Last column
    pub max_x: i32,
    /// Last row
    pub max_y: i32,
}

impl CellRange {
    /// Range covering a single cell.
    pub const fn single(coord: CellCoord) -> Self {
        Self { min_x: coord.x, min_y: coord.y, max_x: coord.x, max_y: coord.y }
    }

    /// Membership test.
    #[inline]
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.x >= self.min_x && coord.x <= self.max_x && coord.y >= self.min_y && coord.y <= self.max_y
    }

    /// Overlap of two ranges, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let range = Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        (range.min_x <= range.max_x && range.min_y <= range.max_y).then_some(range)
    }

    /// Smallest range containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// True if `coord` lies on the outer ring of the range.
    pub fn on_edge(&self, coord: CellCoord) -> bool {
        coord.x == self.min_x || coord.x == self.max_x || coord.y == self.min_y || coord.y == self.max_y
    }

    /// Every coordinate, column-major (x, then y).
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let (min_y, max_y) = (self.min_y, self.max_y);
        (self.min_x..=self.max_x).flat_map(move |x| (min_y..=max_y).map(move |y| CellCoord::new(x, y)))
    }
}

// =============================================================================
// CELLS
// =============================================================================

/// How locators are ordered within a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    /// By draw priority, then object serial
    #[default]
    Flat,
    /// By absolute y ascending (lower objects drawn over higher ones)
    YOver,
    /// By absolute y descending
    YUnder,
}

/// Ordering key of a locator within a cell.
///
/// `priority` is zero outside of [`DrawMode::Flat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawKey {
    /// Draw priority
    pub priority: i32,
    /// Owning object's serial
    pub serial: u64,
    /// Locator hitbox
    pub hitbox: HitboxId,
}

/// One grid cell.
#[derive(Clone, Debug, Default)]
pub struct Cell {
    locators: BTreeSet<DrawKey>,
    centers: BTreeSet<HitboxId>,
    overlaps: BTreeSet<HitboxId>,
    solids: BTreeSet<HitboxId>,
    collisions: BTreeSet<HitboxId>,
}

impl Cell {
    /// Hitboxes held under `role`. Locators come in draw-key order.
    pub fn hitboxes(&self, role: Role) -> Box<dyn Iterator<Item = HitboxId> + '_> {
        match role {
            Role::Locator => Box::new(self.locators.iter().map(|k| k.hitbox)),
            _ => Box::new(self.set(role).iter().copied()),
        }
    }

    /// Locator draw keys in order.
    pub fn draw_keys(&self) -> impl Iterator<Item = &DrawKey> {
        self.locators.iter()
    }

    /// True if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
            && self.centers.is_empty()
            && self.overlaps.is_empty()
            && self.solids.is_empty()
            && self.collisions.is_empty()
    }

    fn set(&self, role: Role) -> &BTreeSet<HitboxId> {
        match role {
            Role::Center => &self.centers,
            Role::Overlap => &self.overlaps,
            Role::Solid => &self.solids,
            Role::Collision => &self.collisions,
            Role::Locator => unreachable!("locators are keyed by draw order"),
        }
    }

    fn set_mut(&mut self, role: Role) -> &mut BTreeSet<HitboxId> {
        match role {
            Role::Center => &mut self.centers,
            Role::Overlap => &mut self.overlaps,
            Role::Solid => &mut self.solids,
            Role::Collision => &mut self.collisions,
            Role::Locator => unreachable!("locators are keyed by draw order"),
        }
    }

    fn insert(&mut self, role: Role, id: HitboxId, key: DrawKey) {
        match role {
            Role::Locator => { self.locators.insert(key); }
            _ => { self.set_mut(role).insert(id); }
        }
    }

    fn remove(&mut self, role: Role, id: HitboxId, key: DrawKey) {
        match role {
            Role::Locator => { self.locators.remove(&key); }
            _ => { self.set_mut(role).remove(&id); }
        }
    }
}

// =============================================================================
// GRID
// =============================================================================

/// Cell map plus the geometry needed to address it.
#[derive(Clone, Debug)]
pub struct Grid {
    cell_width: Fixed,
    cell_height: Fixed,
    draw_mode: DrawMode,
    cells: BTreeMap<CellCoord, Cell>,
    /// Min/max over existing cells
    bounds: Option<CellRange>,
}

impl Grid {
    /// Empty grid.
    ///
    /// # Panics
    /// Panics if either dimension is not positive.
    pub fn new(cell_width: Fixed, cell_height: Fixed, draw_mode: DrawMode) -> Self {
        assert!(cell_width > 0, "cell width must be positive, got {}", cell_width);
        assert!(cell_height > 0, "cell height must be positive, got {}", cell_height);
        Self {
            cell_width,
            cell_height,
            draw_mode,
            cells: BTreeMap::new(),
            bounds: None,
        }
    }

    /// Cell width.
    pub fn cell_width(&self) -> Fixed {
        self.cell_width
    }

    /// Cell height.
    pub fn cell_height(&self) -> Fixed {
        self.cell_height
    }

    /// Current draw mode.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Min/max coordinates over existing cells.
    pub fn bounds(&self) -> Option<CellRange> {
        self.bounds
    }

    /// Number of existing cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// A cell, if it exists.
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// Every cell the closed box touches.
    pub fn inclusive_range(&self, bounds: &BoundingBox) -> CellRange {
        CellRange {
            min_x: ceil_div(bounds.left, self.cell_width) - 1,
            min_y: ceil_div(bounds.top, self.cell_height) - 1,
            max_x: floor_div(bounds.right, self.cell_width),
            max_y: floor_div(bounds.bottom, self.cell_height),
        }
    }

    /// Cells the box's interior crosses; never empty.
    pub fn exclusive_range(&self, bounds: &BoundingBox) -> CellRange {
        let min_x = floor_div(bounds.left, self.cell_width);
        let min_y = floor_div(bounds.top, self.cell_height);
        CellRange {
            min_x,
            min_y,
            max_x: min_x.max(ceil_div(bounds.right, self.cell_width) - 1),
            max_y: min_y.max(ceil_div(bounds.bottom, self.cell_height) - 1),
        }
    }

    /// Existing cells inside `range`, in coordinate order.
    pub fn existing_cells(&self, range: CellRange) -> impl Iterator<Item = (&CellCoord, &Cell)> + '_ {
        let clamped = self.bounds.and_then(|b| b.intersect(&range));
        clamped.into_iter().flat_map(move |r| {
            (r.min_x..=r.max_x).flat_map(move |x| {
                self.cells.range(CellCoord::new(x, r.min_y)..=CellCoord::new(x, r.max_y))
            })
        })
    }

    fn draw_key(&self, id: HitboxId, hitbox: &Hitbox) -> DrawKey {
        DrawKey {
            priority: if self.draw_mode == DrawMode::Flat { hitbox.draw_priority } else { 0 },
            serial: hitbox.serial,
            hitbox: id,
        }
    }

    fn insert_into(&mut self, range: CellRange, role: Role, id: HitboxId, key: DrawKey) {
        for coord in range.coords() {
            self.cells.entry(coord).or_default().insert(role, id, key);
        }
        let grown = match self.bounds {
            Some(b) => b.union(&range),
            None => range,
        };
        self.bounds = Some(grown);
    }

    fn remove_from(&mut self, range: CellRange, role: Role, id: HitboxId, key: DrawKey) {
        let mut pruned_edge = false;
        for coord in range.coords() {
            let Some(cell) = self.cells.get_mut(&coord) else {
                continue;
            };
            cell.remove(role, id, key);
            if cell.is_empty() {
                self.cells.remove(&coord);
                pruned_edge |= self.bounds.map_or(false, |b| b.on_edge(coord));
            }
        }
        if pruned_edge {
            self.recompute_bounds();
        }
    }

    fn recompute_bounds(&mut self) {
        self.bounds = self.cells.keys().fold(None, |acc: Option<CellRange>, coord| {
            let single = CellRange::single(*coord);
            Some(acc.map_or(single, |b| b.union(&single)))
        });
    }

    /// Start indexing `hitbox` under `role`. No-op if already held.
    pub fn add_role(&mut self, id: HitboxId, hitbox: &mut Hitbox, role: Role) {
        if hitbox.roles.contains(role) {
            return;
        }
        let range = match hitbox.cells {
            Some(range) => range,
            None => {
                let range = self.inclusive_range(&hitbox.bounds);
                hitbox.cells = Some(range);
                range
            }
        };
        let key = self.draw_key(id, hitbox);
        self.insert_into(range, role, id, key);
        hitbox.roles.insert(role);
    }

    /// Stop indexing `hitbox` under `role`. No-op if not held.
    pub fn remove_role(&mut self, id: HitboxId, hitbox: &mut Hitbox, role: Role) {
        if !hitbox.roles.contains(role) {
            return;
        }
        if let Some(range) = hitbox.cells {
            let key = self.draw_key(id, hitbox);
            self.remove_from(range, role, id, key);
        }
        hitbox.roles.remove(role);
        if hitbox.roles.is_empty() {
            hitbox.cells = None;
        }
    }

    /// Re-register after the hitbox's bounds changed.
    pub fn update_cells(&mut self, id: HitboxId, hitbox: &mut Hitbox) {
        let Some(old) = hitbox.cells else {
            return;
        };
        let new = self.inclusive_range(&hitbox.bounds);
        if new == old {
            return;
        }
        let key = self.draw_key(id, hitbox);
        for role in hitbox.roles.iter() {
            self.remove_from(old, role, id, key);
            self.insert_into(new, role, id, key);
        }
        hitbox.cells = Some(new);
    }

    /// Change a locator's draw priority, re-keying it where that matters.
    pub fn reprioritize(&mut self, id: HitboxId, hitbox: &mut Hitbox, priority: i32) {
        let keyed = hitbox.roles.contains(Role::Locator) && self.draw_mode == DrawMode::Flat;
        match (keyed, hitbox.cells) {
            (true, Some(range)) => {
                let old_key = self.draw_key(id, hitbox);
                self.remove_from(range, Role::Locator, id, old_key);
                hitbox.draw_priority = priority;
                let new_key = self.draw_key(id, hitbox);
                self.insert_into(range, Role::Locator, id, new_key);
            }
            _ => hitbox.draw_priority = priority,
        }
    }

    /// Change cell geometry and draw mode, re-indexing every hitbox.
    ///
    /// # Panics
    /// Panics if either dimension is not positive.
    pub fn rebuild(
        &mut self,
        hitboxes: &mut SlotMap<HitboxId, Hitbox>,
        cell_width: Fixed,
        cell_height: Fixed,
        draw_mode: DrawMode,
    ) {
        assert!(cell_width > 0, "cell width must be positive, got {}", cell_width);
        assert!(cell_height > 0, "cell height must be positive, got {}", cell_height);
        self.cell_width = cell_width;
        self.cell_height = cell_height;
        self.draw_mode = draw_mode;
        self.cells.clear();
        self.bounds = None;

        let mut indexed = 0usize;
        for (id, hitbox) in hitboxes.iter_mut() {
            if hitbox.roles.is_empty() {
                continue;
            }
            let range = self.inclusive_range(&hitbox.bounds);
            hitbox.cells = Some(range);
            let key = self.draw_key(id, hitbox);
            for role in hitbox.roles.iter() {
                self.insert_into(range, role, id, key);
            }
            indexed += 1;
        }
        debug!(cell_width, cell_height, ?draw_mode, indexed, "grid rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};
    use crate::core::vec2::FixedVec2;
    use crate::geom::{Shape, Transform};
    use crate::space::hitbox::HitboxKind;
    use proptest::prelude::*;

    fn grid100() -> Grid {
        Grid::new(100 * FIXED_ONE, 100 * FIXED_ONE, DrawMode::Flat)
    }

    fn span(l: f64, t: f64, r: f64, b: f64) -> BoundingBox {
        BoundingBox::new(to_fixed(l), to_fixed(t), to_fixed(r), to_fixed(b))
    }

    fn boxed(arena: &mut SlotMap<HitboxId, Hitbox>, x: i32, y: i32, w: i32, h: i32) -> HitboxId {
        arena.insert(Hitbox::new(
            HitboxKind::Primitive(Shape::rectangle(0, 0, w << 16, h << 16)),
            Transform::at(FixedVec2::from_ints(x, y)),
        ))
    }

    #[test]
    fn test_inclusive_range_example() {
        let grid = grid100();
        let range = grid.inclusive_range(&span(150.0, 150.0, 250.0, 250.0));
        assert_eq!((range.min_x, range.max_x), (1, 2));
        assert_eq!((range.min_y, range.max_y), (1, 2));
    }

    #[test]
    fn test_inclusive_range_includes_touched_boundaries() {
        let grid = grid100();
        let range = grid.inclusive_range(&span(100.0, -100.0, 200.0, 0.0));
        assert_eq!((range.min_x, range.max_x), (0, 2), "cells 0 and 2 touch the edges");
        assert_eq!((range.min_y, range.max_y), (-2, 0));
    }

    #[test]
    fn test_exclusive_range() {
        let grid = grid100();
        let range = grid.exclusive_range(&span(100.0, 150.0, 200.0, 250.0));
        assert_eq!((range.min_x, range.max_x), (1, 1));
        assert_eq!((range.min_y, range.max_y), (1, 2));

        let point = grid.exclusive_range(&span(300.0, -50.0, 300.0, -50.0));
        assert_eq!((point.min_x, point.max_x), (3, 3), "degenerate range keeps one column");
        assert_eq!((point.min_y, point.max_y), (-1, -1));
    }

    #[test]
    fn test_add_remove_role_prunes_cells() {
        let mut arena = SlotMap::with_key();
        let id = boxed(&mut arena, 150, 150, 100, 100);
        let mut grid = grid100();

        grid.add_role(id, &mut arena[id], Role::Solid);
        grid.add_role(id, &mut arena[id], Role::Overlap);
        assert_eq!(grid.cell_count(), 4);
        assert_eq!(grid.bounds(), Some(CellRange { min_x: 1, min_y: 1, max_x: 2, max_y: 2 }));
        let cell = grid.cell(CellCoord::new(2, 1)).unwrap();
        assert_eq!(cell.hitboxes(Role::Solid).collect::<Vec<_>>(), vec![id]);

        grid.remove_role(id, &mut arena[id], Role::Solid);
        assert_eq!(grid.cell_count(), 4, "overlap role still indexed");
        assert!(arena[id].cells().is_some());

        grid.remove_role(id, &mut arena[id], Role::Overlap);
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.bounds(), None);
        assert!(arena[id].cells().is_none());
    }

    #[test]
    fn test_update_cells_moves_hitbox() {
        let mut arena = SlotMap::with_key();
        let id = boxed(&mut arena, 10, 10, 20, 20);
        let mut grid = grid100();
        grid.add_role(id, &mut arena[id], Role::Center);

        arena[id].bounds = span(510.0, 10.0, 530.0, 30.0);
        grid.update_cells(id, &mut arena[id]);

        assert!(grid.cell(CellCoord::new(0, 0)).is_none());
        assert!(grid.cell(CellCoord::new(5, 0)).is_some());
        assert_eq!(grid.bounds(), Some(CellRange { min_x: 5, min_y: 0, max_x: 5, max_y: 0 }));
    }

    #[test]
    fn test_flat_draw_order_by_priority() {
        let mut arena = SlotMap::with_key();
        let a = boxed(&mut arena, 10, 10, 5, 5);
        let b = boxed(&mut arena, 20, 20, 5, 5);
        arena[a].serial = 1;
        arena[b].serial = 2;
        let mut grid = grid100();
        grid.add_role(a, &mut arena[a], Role::Locator);
        grid.add_role(b, &mut arena[b], Role::Locator);

        let order = |g: &Grid| g.cell(CellCoord::new(0, 0)).unwrap().hitboxes(Role::Locator).collect::<Vec<_>>();
        assert_eq!(order(&grid), vec![a, b]);

        grid.reprioritize(a, &mut arena[a], 5);
        assert_eq!(order(&grid), vec![b, a]);
    }

    #[test]
    fn test_existing_cells_clamped() {
        let mut arena = SlotMap::with_key();
        let id = boxed(&mut arena, 150, 150, 10, 10);
        let mut grid = grid100();
        grid.add_role(id, &mut arena[id], Role::Center);

        let wide = CellRange { min_x: -1000, min_y: -1000, max_x: 1000, max_y: 1000 };
        let found: Vec<CellCoord> = grid.existing_cells(wide).map(|(c, _)| *c).collect();
        assert_eq!(found, vec![CellCoord::new(1, 1)]);
    }

    #[test]
    fn test_rebuild_reindexes() {
        let mut arena = SlotMap::with_key();
        let id = boxed(&mut arena, 150, 150, 100, 100);
        let mut grid = grid100();
        grid.add_role(id, &mut arena[id], Role::Overlap);

        grid.rebuild(&mut arena, 50 * FIXED_ONE, 1000 * FIXED_ONE, DrawMode::YOver);
        assert_eq!(arena[id].cells(), Some(CellRange { min_x: 2, min_y: 0, max_x: 5, max_y: 0 }));
        assert_eq!(grid.draw_mode(), DrawMode::YOver);
    }

    #[test]
    #[should_panic]
    fn test_zero_cell_width_panics() {
        let _ = Grid::new(0, FIXED_ONE, DrawMode::Flat);
    }

    proptest! {
        #[test]
        fn test_inclusive_range_is_exactly_the_touched_cells(
            l in -5000i32..5000, t in -5000i32..5000, w in 0i32..3000, h in 0i32..3000,
        ) {
            let grid = Grid::new(100 << 8, 70 << 8, DrawMode::Flat);
            let bounds = BoundingBox::new(l << 8, t << 8, (l + w) << 8, (t + h) << 8);
            let range = grid.inclusive_range(&bounds);
            for x in range.min_x - 2..=range.max_x + 2 {
                for y in range.min_y - 2..=range.max_y + 2 {
                    let cell = BoundingBox::new(
                        x * grid.cell_width(), y * grid.cell_height(),
                        (x + 1) * grid.cell_width(), (y + 1) * grid.cell_height(),
                    );
                    prop_assert_eq!(range.contains(CellCoord::new(x, y)), cell.meets(&bounds));
                }
            }
        }
    }
}
