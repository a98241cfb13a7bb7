//! Layout engine: grid dimensions, pixel geometry, event bars, hit testing.
//!
//! [`compute_layout`] is the whole pipeline as a pure function. The
//! [`LayoutEngine`] wraps it with explicit inputs and caches, recomputing only
//! the stages an input change invalidates:
//!
//! - viewport or metrics → grid dimensions (and, if the column count moved,
//!   segments)
//! - year → days, index, dimensions, segments
//! - events → segments
//! - measured cell size or today → geometry only
//!
//! Every stage is deterministic, so the same inputs always give the same
//! [`Layout`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::days::{index_by_day_key, year_days, Day, DayIndex};
use crate::event::AllDayEvent;
use crate::expand::{expand_to_date_map, events_on};
use crate::grid::{best_grid_dimensions, GridDimensions};
use crate::lanes::{assign_lanes, max_lanes_for, segment_events, PlacedSegment, SegmentPass};

/// Available drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Fixed pixel measures of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// Gap between neighbouring cells.
    pub gap_px: u32,
    /// Space reserved at the top of each cell for the day number.
    pub label_offset_px: f32,
    /// Height of one event lane.
    pub lane_height_px: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            gap_px: 1,
            label_offset_px: 18.0,
            lane_height_px: 12.0,
        }
    }
}

/// Size of one rendered day cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl CellSize {
    pub fn square(px: u32) -> Self {
        Self {
            width: px as f32,
            height: px as f32,
        }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned pixel rectangle relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
    pub is_first_of_month: bool,
    pub is_today: bool,
    pub is_weekend: bool,
    /// Month name, only on the first day of a month.
    pub month_label: Option<&'static str>,
    /// Number of events covering this day, drawn or not.
    pub event_count: usize,
}

/// A positioned bar for one event segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBar {
    pub event_id: String,
    pub event_index: usize,
    pub calendar_id: String,
    pub title: String,
    pub row: usize,
    pub lane: usize,
    pub start_col: usize,
    pub span: usize,
    pub rect: Rect,
}

/// Counts of what the layout left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LayoutDiagnostics {
    pub skipped_events: usize,
    pub dropped_segments: usize,
    pub max_lanes: usize,
    pub lanes_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub year: i32,
    pub dimensions: GridDimensions,
    /// Cell size the geometry was computed with.
    pub cell: CellSize,
    pub gap_px: u32,
    pub cells: Vec<DayCell>,
    pub bars: Vec<EventBar>,
    pub diagnostics: LayoutDiagnostics,
}

/// What a pointer position resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Event(AllDayEvent),
    Day(NaiveDate),
}

fn pitch(size: f32, gap_px: u32) -> f32 {
    size + gap_px as f32
}

/// Day cells with pixel rectangles and display markers.
pub fn render(
    days: &[Day],
    dimensions: &GridDimensions,
    cell: CellSize,
    gap_px: u32,
    today: Option<NaiveDate>,
    events: &[AllDayEvent],
) -> Vec<DayCell> {
    let columns = dimensions.columns.max(1);
    let date_map = expand_to_date_map(events);

    days.iter()
        .map(|day| {
            let row = day.index / columns;
            let col = day.index % columns;
            DayCell {
                date: day.date,
                index: day.index,
                row,
                col,
                rect: Rect {
                    left: col as f32 * pitch(cell.width, gap_px),
                    top: row as f32 * pitch(cell.height, gap_px),
                    width: cell.width,
                    height: cell.height,
                },
                is_first_of_month: day.is_first_of_month(),
                is_today: today == Some(day.date),
                is_weekend: day.is_weekend(),
                month_label: day.is_first_of_month().then(|| day.month_label()),
                event_count: events_on(&date_map, day.date).len(),
            }
        })
        .collect()
}

/// Pixel bars for lane-assigned segments.
pub fn place_events(
    events: &[AllDayEvent],
    placed: &[PlacedSegment],
    cell: CellSize,
    metrics: &LayoutMetrics,
) -> Vec<EventBar> {
    placed
        .iter()
        .filter_map(|p| {
            let event = events.get(p.segment.event_index)?;
            let span = p.segment.span();
            Some(EventBar {
                event_id: event.id.clone(),
                event_index: p.segment.event_index,
                calendar_id: event.calendar_id.clone(),
                title: event.title.clone(),
                row: p.segment.row,
                lane: p.lane,
                start_col: p.segment.start_col,
                span,
                rect: Rect {
                    left: p.segment.start_col as f32 * pitch(cell.width, metrics.gap_px),
                    top: p.segment.row as f32 * pitch(cell.height, metrics.gap_px)
                        + metrics.label_offset_px
                        + p.lane as f32 * metrics.lane_height_px,
                    width: span as f32 * cell.width
                        + span.saturating_sub(1) as f32 * metrics.gap_px as f32,
                    height: metrics.lane_height_px,
                },
            })
        })
        .collect()
}

fn assemble(
    year: i32,
    days: &[Day],
    events: &[AllDayEvent],
    dimensions: GridDimensions,
    segments: &SegmentPass,
    metrics: &LayoutMetrics,
    measured: Option<CellSize>,
    today: Option<NaiveDate>,
) -> Layout {
    let cell = measured
        .filter(CellSize::is_usable)
        .unwrap_or_else(|| CellSize::square(dimensions.cell_size_px));

    let max_lanes = max_lanes_for(cell.height, metrics.label_offset_px, metrics.lane_height_px);
    let lanes = assign_lanes(segments.segments.clone(), max_lanes);

    Layout {
        year,
        dimensions,
        cell,
        gap_px: metrics.gap_px,
        cells: render(days, &dimensions, cell, metrics.gap_px, today, events),
        bars: place_events(events, &lanes.placed, cell, metrics),
        diagnostics: LayoutDiagnostics {
            skipped_events: segments.skipped_events,
            dropped_segments: lanes.dropped,
            max_lanes,
            lanes_used: lanes.lanes_used,
        },
    }
}

/// The full layout pipeline for one set of inputs.
pub fn compute_layout(
    year: i32,
    events: &[AllDayEvent],
    viewport: Viewport,
    metrics: &LayoutMetrics,
    measured: Option<CellSize>,
    today: Option<NaiveDate>,
) -> Layout {
    let days = year_days(year);
    let index = index_by_day_key(&days);
    let dimensions =
        best_grid_dimensions(days.len(), viewport.width, viewport.height, metrics.gap_px);
    let segments = segment_events(events, &index, dimensions.columns);
    assemble(year, &days, events, dimensions, &segments, metrics, measured, today)
}

/// Resolve a pointer position against a computed layout.
///
/// Bars win over the cell underneath; among overlapping bars the one placed
/// last (drawn on top) wins. Points in the gaps between cells or outside the
/// grid resolve to nothing.
pub fn hit_test(layout: &Layout, events: &[AllDayEvent], x: f32, y: f32) -> Option<HitTarget> {
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return None;
    }

    let bar_hit = layout
        .bars
        .iter()
        .rev()
        .filter(|bar| bar.rect.contains(x, y))
        .find_map(|bar| {
            events
                .get(bar.event_index)
                .filter(|event| event.id == bar.event_id)
        });
    if let Some(event) = bar_hit {
        return Some(HitTarget::Event(event.clone()));
    }

    let col = (x / pitch(layout.cell.width, layout.gap_px)).floor() as usize;
    let row = (y / pitch(layout.cell.height, layout.gap_px)).floor() as usize;
    if col >= layout.dimensions.columns || row >= layout.dimensions.rows {
        return None;
    }

    let index = row.checked_mul(layout.dimensions.columns)?.checked_add(col)?;
    layout
        .cells
        .get(index)
        .filter(|cell| cell.rect.contains(x, y))
        .map(|cell| HitTarget::Day(cell.date))
}

/// Holds the current layout inputs and recomputes on demand.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    year: i32,
    viewport: Viewport,
    metrics: LayoutMetrics,
    events: Vec<AllDayEvent>,
    today: Option<NaiveDate>,
    measured: Option<CellSize>,

    days: Vec<Day>,
    index: DayIndex,
    dimensions: GridDimensions,
    dimensions_stale: bool,
    segments: Option<SegmentPass>,
    layout: Option<Layout>,
}

impl LayoutEngine {
    pub fn new(year: i32, viewport: Viewport, metrics: LayoutMetrics) -> Self {
        let days = year_days(year);
        let index = index_by_day_key(&days);
        let dimensions =
            best_grid_dimensions(days.len(), viewport.width, viewport.height, metrics.gap_px);

        Self {
            year,
            viewport,
            metrics,
            events: Vec::new(),
            today: None,
            measured: None,
            days,
            index,
            dimensions,
            dimensions_stale: false,
            segments: None,
            layout: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn events(&self) -> &[AllDayEvent] {
        &self.events
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn set_year(&mut self, year: i32) {
        if year == self.year {
            return;
        }
        tracing::debug!(year, "layout year changed");
        self.year = year;
        self.days = year_days(year);
        self.index = index_by_day_key(&self.days);
        self.dimensions_stale = true;
        self.segments = None;
        self.layout = None;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.dimensions_stale = true;
        self.layout = None;
    }

    pub fn set_metrics(&mut self, metrics: LayoutMetrics) {
        if metrics == self.metrics {
            return;
        }
        self.metrics = metrics;
        self.dimensions_stale = true;
        self.layout = None;
    }

    /// Replace the event list. The previous list is dropped as a whole.
    pub fn set_events(&mut self, events: Vec<AllDayEvent>) {
        self.events = events;
        self.segments = None;
        self.layout = None;
    }

    /// Feed back the size of a cell as actually rendered, which can differ
    /// from the computed target by rounding.
    pub fn set_measured_cell_size(&mut self, cell: CellSize) {
        if !cell.is_usable() || self.measured == Some(cell) {
            return;
        }
        self.measured = Some(cell);
        self.layout = None;
    }

    pub fn set_today(&mut self, today: Option<NaiveDate>) {
        if today == self.today {
            return;
        }
        self.today = today;
        self.layout = None;
    }

    /// Current layout, recomputing whatever the last input changes made stale.
    pub fn layout(&mut self) -> &Layout {
        if self.dimensions_stale {
            self.refresh_dimensions();
        }

        let segments = match self.segments.take() {
            Some(segments) => segments,
            None => {
                self.layout = None;
                segment_events(&self.events, &self.index, self.dimensions.columns)
            }
        };

        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => {
                let layout = assemble(
                    self.year,
                    &self.days,
                    &self.events,
                    self.dimensions,
                    &segments,
                    &self.metrics,
                    self.measured,
                    self.today,
                );
                tracing::trace!(
                    bars = layout.bars.len(),
                    skipped = layout.diagnostics.skipped_events,
                    dropped = layout.diagnostics.dropped_segments,
                    "layout recomputed"
                );
                layout
            }
        };

        self.segments = Some(segments);
        self.layout.insert(layout)
    }

    /// Resolve a pointer position to an event or a day.
    pub fn hit_test(&mut self, x: f32, y: f32) -> Option<HitTarget> {
        self.layout();
        let layout = self.layout.as_ref()?;
        hit_test(layout, &self.events, x, y)
    }

    fn refresh_dimensions(&mut self) {
        self.dimensions_stale = false;
        let dimensions = best_grid_dimensions(
            self.days.len(),
            self.viewport.width,
            self.viewport.height,
            self.metrics.gap_px,
        );
        if dimensions == self.dimensions {
            return;
        }

        tracing::debug!(
            columns = dimensions.columns,
            cell_size_px = dimensions.cell_size_px,
            overflows = dimensions.overflows,
            "grid dimensions recomputed"
        );
        if dimensions.columns != self.dimensions.columns {
            self.segments = None;
        }
        self.dimensions = dimensions;
        // a measurement taken at the old size no longer applies
        self.measured = None;
        self.layout = None;
    }
}
