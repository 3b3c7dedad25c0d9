//! Toroidal uniform grid over trail segments
//!
//! Divides the world into fixed cells and stores each segment in the cell
//! containing its anchor. Nearby queries return the 3x3 block of cells
//! around a point, wrapping at the world edges. Segments are never moved or
//! removed once inserted.

use smallvec::SmallVec;

use crate::game::constants::grid::CELL_INITIAL_CAPACITY;
use crate::game::trail::Segment;
use crate::util::vec2::Vec2;

/// Flat index into the grid's cell array
pub type CellIndex = usize;

/// Broken index invariants; a defect, never a runtime condition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    #[error("Segment anchor is not finite: ({0}, {1})")]
    NonFiniteAnchor(f32, f32),
    #[error("Cell ({cx}, {cy}) outside {columns}x{rows} grid for anchor ({x}, {y})")]
    CellOutOfRange {
        cx: i64,
        cy: i64,
        columns: usize,
        rows: usize,
        x: f32,
        y: f32,
    },
}

/// Uniform grid of segment buckets on a wrapping plane
#[derive(Debug, Clone)]
pub struct SegmentGrid {
    dimensions: Vec2,
    /// Cells per world unit on each axis (cells are at least `min_cell_size` wide)
    cells_per_unit: Vec2,
    columns: usize,
    rows: usize,
    /// Row-major buckets, `columns * rows` long
    cells: Vec<Vec<Segment>>,
    len: usize,
}

impl SegmentGrid {
    /// Create an empty grid covering `dimensions`
    ///
    /// The cell count per axis is rounded down so that every cell is at
    /// least `min_cell_size` wide and the grid tiles the torus exactly.
    pub fn new(dimensions: Vec2, min_cell_size: f32) -> Self {
        let columns = cells_along(dimensions.x, min_cell_size);
        let rows = cells_along(dimensions.y, min_cell_size);

        Self {
            dimensions,
            cells_per_unit: Vec2::new(
                columns as f32 / dimensions.x,
                rows as f32 / dimensions.y,
            ),
            columns,
            rows,
            cells: vec![Vec::new(); columns * rows],
            len: 0,
        }
    }

    /// Grid size in cells (columns, rows)
    pub fn size_in_cells(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Actual cell edge lengths
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.dimensions.x / self.columns as f32,
            self.dimensions.y / self.rows as f32,
        )
    }

    /// Number of stored segments
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cell coordinates of a point, unwrapped
    #[inline]
    fn cell_coords(&self, position: Vec2) -> (i64, i64) {
        let scaled = position.mul_elem(self.cells_per_unit).floor();
        (scaled.x as i64, scaled.y as i64)
    }

    #[inline]
    fn wrapped_index(&self, cx: i64, cy: i64) -> CellIndex {
        let x = cx.rem_euclid(self.columns as i64) as usize;
        let y = cy.rem_euclid(self.rows as i64) as usize;
        y * self.columns + x
    }

    /// Cell index of an in-world anchor
    pub fn cell_index(&self, anchor: Vec2) -> Result<CellIndex, SpatialError> {
        if !anchor.is_finite() {
            return Err(SpatialError::NonFiniteAnchor(anchor.x, anchor.y));
        }

        let (mut cx, mut cy) = self.cell_coords(anchor);
        // Rounding can push an anchor just below the far edge into cell `columns`
        if anchor.x < self.dimensions.x {
            cx = cx.min(self.columns as i64 - 1);
        }
        if anchor.y < self.dimensions.y {
            cy = cy.min(self.rows as i64 - 1);
        }
        if cx < 0 || cy < 0 || cx >= self.columns as i64 || cy >= self.rows as i64 {
            return Err(SpatialError::CellOutOfRange {
                cx,
                cy,
                columns: self.columns,
                rows: self.rows,
                x: anchor.x,
                y: anchor.y,
            });
        }

        Ok(cy as usize * self.columns + cx as usize)
    }

    /// Store a segment in the cell containing its anchor
    ///
    /// The anchor must already be wrapped into the world; anything else is
    /// reported rather than silently re-wrapped.
    pub fn insert(&mut self, segment: Segment) -> Result<CellIndex, SpatialError> {
        let index = self.cell_index(segment.anchor)?;
        let cell = &mut self.cells[index];
        if cell.capacity() == 0 {
            cell.reserve(CELL_INITIAL_CAPACITY);
        }
        cell.push(segment);
        self.len += 1;
        Ok(index)
    }

    /// Distinct cells of the 3x3 block around a point, wrapping at the edges
    ///
    /// Grids narrower than three cells on an axis would otherwise visit the
    /// same cell twice.
    pub fn neighbour_cells(&self, position: Vec2) -> SmallVec<[CellIndex; 9]> {
        let (cx, cy) = self.cell_coords(position.wrap(self.dimensions));
        let mut out: SmallVec<[CellIndex; 9]> = SmallVec::new();

        for dy in -1..=1 {
            for dx in -1..=1 {
                let index = self.wrapped_index(cx + dx, cy + dy);
                if !out.contains(&index) {
                    out.push(index);
                }
            }
        }

        out
    }

    /// Segments stored in the 3x3 block of cells around `position`
    ///
    /// Never misses a segment whose anchor is within one cell width of the
    /// point on either axis.
    pub fn query_near(&self, position: Vec2) -> impl Iterator<Item = &Segment> + '_ {
        self.neighbour_cells(position)
            .into_iter()
            .flat_map(move |index| self.cells[index].iter())
    }

    /// Visit all segments, cell by cell
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(&Segment),
    {
        for cell in &self.cells {
            for segment in cell {
                callback(segment);
            }
        }
    }

    /// Iterate all segments, cell by cell
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.cells.iter().flat_map(|cell| cell.iter())
    }

    /// Get statistics about the grid
    pub fn stats(&self) -> SegmentGridStats {
        let non_empty_cells = self.cells.iter().filter(|c| !c.is_empty()).count();
        let max_per_cell = self.cells.iter().map(|c| c.len()).max().unwrap_or(0);

        SegmentGridStats {
            columns: self.columns,
            rows: self.rows,
            non_empty_cells,
            total_segments: self.len,
            max_per_cell,
        }
    }
}

/// Number of whole cells of at least `min_cell_size` along an axis
fn cells_along(extent: f32, min_cell_size: f32) -> usize {
    let count = (extent / min_cell_size).floor();
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// Statistics about the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentGridStats {
    pub columns: usize,
    pub rows: usize,
    pub non_empty_cells: usize,
    pub total_segments: usize,
    pub max_per_cell: usize,
}
