//! Year-grid layout engine.
//!
//! Lays the days of a calendar year out on a square-celled grid that fits a
//! viewport, splits multi-day all-day events into per-row segments, stacks
//! them into lanes and exposes pixel geometry plus hit testing.
//!
//! Everything in this crate is synchronous and free of I/O. The only state
//! lives in [`LayoutEngine`], which caches the output of [`compute_layout`].

pub mod days;
pub mod engine;
pub mod event;
pub mod expand;
pub mod grid;
pub mod lanes;

pub use days::{index_by_day_key, is_leap_year, year_days, Day, DayIndex};
pub use engine::{
    compute_layout, hit_test, place_events, render, CellSize, DayCell, EventBar, HitTarget,
    Layout, LayoutDiagnostics, LayoutEngine, LayoutMetrics, Rect, Viewport,
};
pub use event::{AllDayEvent, InvalidEvent};
pub use expand::{expand_to_date_map, DateMap};
pub use grid::{best_grid_dimensions, GridDimensions};
pub use lanes::{
    assign_lanes, max_lanes_for, segment_events, LanePass, PlacedSegment, Segment, SegmentPass,
};
