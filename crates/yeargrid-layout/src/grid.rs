//! Choosing column count and cell size for a viewport.

use serde::{Deserialize, Serialize};

/// Cell size returned for zero or negative viewports.
pub const DEGENERATE_CELL_PX: u32 = 10;

/// Column count and per-cell size of the year grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub columns: usize,
    pub cell_size_px: u32,
    pub rows: usize,
    /// Set when no column count fits the viewport height and the grid is
    /// expected to scroll vertically.
    pub overflows: bool,
}

impl GridDimensions {
    pub fn rows_for(total_days: usize, columns: usize) -> usize {
        total_days.div_ceil(columns.max(1))
    }

    /// Total width of the grid including the gaps between columns.
    pub fn rendered_width(&self, gap_px: u32) -> u64 {
        span_px(self.columns, self.cell_size_px, gap_px)
    }

    /// Total height of the grid including the gaps between rows.
    pub fn rendered_height(&self, gap_px: u32) -> u64 {
        span_px(self.rows, self.cell_size_px, gap_px)
    }
}

fn span_px(count: usize, cell: u32, gap: u32) -> u64 {
    if count == 0 {
        return 0;
    }
    count as u64 * cell as u64 + (count as u64 - 1) * gap as u64
}

/// Find the column count giving the largest square cells that still fit.
///
/// Columns are scanned in ascending order and only a strictly larger cell
/// replaces the current best, so ties resolve to the smallest column count.
/// When no count fits the height, a single column as wide as the viewport is
/// returned with `overflows` set.
pub fn best_grid_dimensions(
    total_days: usize,
    viewport_width: i32,
    viewport_height: i32,
    gap_px: u32,
) -> GridDimensions {
    let total_days = total_days.max(1);

    if viewport_width <= 0 || viewport_height <= 0 {
        return GridDimensions {
            columns: 1,
            cell_size_px: DEGENERATE_CELL_PX,
            rows: total_days,
            overflows: true,
        };
    }

    let width = viewport_width as u64;
    let height = viewport_height as u64;
    let gap = gap_px as u64;
    let max_columns = total_days.min(viewport_width as usize);

    let mut best: Option<GridDimensions> = None;

    for columns in 1..=max_columns {
        let gaps = (columns as u64 - 1) * gap;
        let Some(usable) = width.checked_sub(gaps) else {
            break;
        };
        let cell = usable / columns as u64;
        if cell == 0 {
            break;
        }

        let rows = GridDimensions::rows_for(total_days, columns);
        let total_height = rows as u64 * cell + (rows as u64 - 1) * gap;
        if total_height > height {
            continue;
        }

        if best.map_or(true, |b| cell > b.cell_size_px as u64) {
            best = Some(GridDimensions {
                columns,
                cell_size_px: cell.min(u32::MAX as u64) as u32,
                rows,
                overflows: false,
            });
        }
    }

    best.unwrap_or_else(|| {
        tracing::debug!(
            total_days,
            viewport_width,
            viewport_height,
            "no column count fits the viewport height, falling back to one column"
        );
        GridDimensions {
            columns: 1,
            cell_size_px: viewport_width as u32,
            rows: total_days,
            overflows: true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_viewport_fits_both_axes() {
        let dims = best_grid_dimensions(365, 100, 50, 1);

        assert!(!dims.overflows);
        assert!(dims.rendered_width(1) <= 100);
        assert!(dims.rendered_height(1) <= 50);
        assert_eq!(dims.columns, 26);
        assert_eq!(dims.cell_size_px, 2);
        assert_eq!(dims.rows, 15);
    }

    #[test]
    fn test_typical_window() {
        let dims = best_grid_dimensions(365, 1200, 800, 1);

        assert_eq!(dims.columns, 24);
        assert_eq!(dims.cell_size_px, 49);
        assert_eq!(dims.rows, 16);
        assert!(dims.rendered_height(1) <= 800);
    }

    #[test]
    fn test_degenerate_viewport() {
        for (w, h) in [(0, 600), (800, 0), (-5, -5)] {
            let dims = best_grid_dimensions(365, w, h, 1);
            assert_eq!(dims.columns, 1);
            assert_eq!(dims.cell_size_px, DEGENERATE_CELL_PX);
        }
    }

    #[test]
    fn test_falls_back_to_single_column_when_height_cannot_fit() {
        let dims = best_grid_dimensions(365, 100, 1, 1);

        assert!(dims.overflows);
        assert_eq!(dims.columns, 1);
        assert_eq!(dims.cell_size_px, 100);
        assert!(dims.rendered_width(1) <= 100);
    }

    #[test]
    fn test_ties_prefer_fewer_columns() {
        // 10 days in 10x6 with no gap: both 4 columns (3 rows) and 5
        // columns (2 rows) fit with 2px cells.
        let dims = best_grid_dimensions(10, 10, 6, 0);
        assert_eq!(dims.columns, 4);
        assert_eq!(dims.cell_size_px, 2);
        assert_eq!(dims.rows, 3);
    }

    #[test]
    fn test_column_count_never_exceeds_days() {
        let dims = best_grid_dimensions(3, 1000, 1000, 1);
        assert!(dims.columns <= 3);
    }
}
