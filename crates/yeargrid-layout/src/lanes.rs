//! Row segmentation and lane packing for multi-day events.
//!
//! An event covering grid indices `[start, end)` is cut at row boundaries
//! into one [`Segment`] per row it touches. Within a row, segments are packed
//! greedily into lanes: sorted by start column, each goes into the first lane
//! whose last segment ended at or before its start. For interval graphs this
//! first-fit sweep uses the minimum number of lanes.

use std::collections::BTreeMap;

use crate::days::DayIndex;
use crate::event::AllDayEvent;

/// The part of one event that falls inside a single grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub event_id: String,
    /// Position of the source event in the input slice.
    pub event_index: usize,
    pub row: usize,
    /// First column covered (inclusive).
    pub start_col: usize,
    /// Column after the last one covered (exclusive, at most the column count).
    pub end_col: usize,
}

impl Segment {
    pub fn span(&self) -> usize {
        self.end_col - self.start_col
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.row == other.row && self.start_col < other.end_col && other.start_col < self.end_col
    }
}

/// A segment with its lane inside the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedSegment {
    pub segment: Segment,
    pub lane: usize,
}

/// Output of [`segment_events`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentPass {
    pub segments: Vec<Segment>,
    /// Events left out because a boundary date is outside the year or the
    /// range is empty.
    pub skipped_events: usize,
}

/// Output of [`assign_lanes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanePass {
    pub placed: Vec<PlacedSegment>,
    /// Segments that needed a lane beyond the row's capacity.
    pub dropped: usize,
    /// Highest number of lanes opened in any row.
    pub lanes_used: usize,
}

/// Cut `[start_idx, end_idx_exclusive)` at row boundaries.
///
/// Returns `(row, start_col, end_col)` triples, one per row crossed.
pub fn split_range(
    start_idx: usize,
    end_idx_exclusive: usize,
    columns: usize,
) -> Vec<(usize, usize, usize)> {
    let columns = columns.max(1);
    let mut spans = Vec::new();
    let mut seg_start = start_idx;

    while seg_start < end_idx_exclusive {
        let row = seg_start / columns;
        let row_end = end_idx_exclusive.min((row + 1) * columns);
        spans.push((row, seg_start % columns, row_end - row * columns));
        seg_start = row_end;
    }

    spans
}

/// Split every event into per-row segments for the given column count.
///
/// Events whose start date is not in the year, whose exclusive end does not
/// resolve, or whose range is empty are skipped. They will be drawn when
/// their own year is displayed.
pub fn segment_events(events: &[AllDayEvent], index: &DayIndex, columns: usize) -> SegmentPass {
    let mut pass = SegmentPass::default();

    for (event_index, event) in events.iter().enumerate() {
        let bounds = index
            .get(event.start_date)
            .zip(index.resolve_end(event.end_date));

        let Some((start_idx, end_idx)) = bounds.filter(|(s, e)| s < e) else {
            tracing::trace!(event_id = %event.id, "event outside displayed year, skipping");
            pass.skipped_events += 1;
            continue;
        };

        pass.segments.extend(split_range(start_idx, end_idx, columns).into_iter().map(
            |(row, start_col, end_col)| Segment {
                event_id: event.id.clone(),
                event_index,
                row,
                start_col,
                end_col,
            },
        ));
    }

    pass
}

/// Pack segments into lanes row by row, opening at most `max_lanes` lanes
/// per row. Segments that do not fit are dropped and counted.
pub fn assign_lanes(segments: Vec<Segment>, max_lanes: usize) -> LanePass {
    let mut by_row: BTreeMap<usize, Vec<Segment>> = BTreeMap::new();
    for segment in segments {
        by_row.entry(segment.row).or_default().push(segment);
    }

    let mut pass = LanePass::default();

    for (_, mut row_segments) in by_row {
        // sort_by_key is stable: equal starts keep input order
        row_segments.sort_by_key(|s| s.start_col);

        let mut lane_ends: Vec<usize> = Vec::new();
        for segment in row_segments {
            let lane = match lane_ends.iter().position(|&end| end <= segment.start_col) {
                Some(lane) => lane,
                None if lane_ends.len() < max_lanes => {
                    lane_ends.push(segment.start_col);
                    lane_ends.len() - 1
                }
                None => {
                    pass.dropped += 1;
                    continue;
                }
            };

            lane_ends[lane] = segment.end_col;
            pass.placed.push(PlacedSegment { segment, lane });
        }

        pass.lanes_used = pass.lanes_used.max(lane_ends.len());
    }

    if pass.dropped > 0 {
        tracing::debug!(dropped = pass.dropped, max_lanes, "rows over lane capacity");
    }

    pass
}

/// How many lanes fit below the day label in a cell.
pub fn max_lanes_for(cell_height: f32, label_offset: f32, lane_height: f32) -> usize {
    if lane_height <= 0.0 || !cell_height.is_finite() {
        return 0;
    }
    ((cell_height - label_offset).max(0.0) / lane_height).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::{index_by_day_key, year_days};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, start: NaiveDate, end: NaiveDate) -> AllDayEvent {
        AllDayEvent::new(id, "cal", id, start, end).unwrap()
    }

    fn seg(event_index: usize, row: usize, start_col: usize, end_col: usize) -> Segment {
        Segment {
            event_id: format!("e{event_index}"),
            event_index,
            row,
            start_col,
            end_col,
        }
    }

    #[test]
    fn test_split_within_one_row() {
        assert_eq!(split_range(2, 5, 7), vec![(0, 2, 5)]);
    }

    #[test]
    fn test_split_ends_exactly_on_row_boundary() {
        assert_eq!(split_range(5, 7, 7), vec![(0, 5, 7)]);
        assert_eq!(split_range(5, 8, 7), vec![(0, 5, 7), (1, 0, 1)]);
    }

    #[test]
    fn test_split_across_three_rows() {
        assert_eq!(
            split_range(5, 20, 7),
            vec![(0, 5, 7), (1, 0, 7), (2, 0, 6)]
        );
    }

    #[test]
    fn test_event_across_week_rows() {
        // Mar 30 2024 is index 89, the exclusive end Apr 2 is index 92
        let days = year_days(2024);
        let index = index_by_day_key(&days);
        let events = vec![event("trip", date(2024, 3, 30), date(2024, 4, 2))];

        let pass = segment_events(&events, &index, 7);

        assert_eq!(pass.skipped_events, 0);
        assert_eq!(pass.segments.len(), 2);
        assert_eq!(pass.segments[0].row, 12);
        assert_eq!(pass.segments[0].start_col, 5);
        assert_eq!(pass.segments[0].end_col, 7);
        assert_eq!(pass.segments[1].row, 13);
        assert_eq!(pass.segments[1].start_col, 0);
        assert_eq!(pass.segments[1].end_col, 1);
    }

    #[test]
    fn test_out_of_year_events_are_skipped() {
        let days = year_days(2024);
        let index = index_by_day_key(&days);
        let events = vec![
            event("spans-in", date(2023, 12, 30), date(2024, 1, 2)),
            event("spans-out", date(2024, 12, 30), date(2025, 1, 3)),
            event("next-year", date(2025, 2, 1), date(2025, 2, 2)),
            event("last-day", date(2024, 12, 31), date(2025, 1, 1)),
            AllDayEvent {
                id: "empty".into(),
                calendar_id: "cal".into(),
                title: "empty".into(),
                start_date: date(2024, 5, 5),
                end_date: date(2024, 5, 5),
            },
        ];

        let pass = segment_events(&events, &index, 7);

        assert_eq!(pass.skipped_events, 4);
        assert_eq!(pass.segments.len(), 1);
        assert_eq!(pass.segments[0].event_id, "last-day");
        // Dec 31 is index 365 = 52 * 7 + 1
        assert_eq!(pass.segments[0].row, 52);
        assert_eq!(pass.segments[0].start_col, 1);
        assert_eq!(pass.segments[0].end_col, 2);
    }

    #[test]
    fn test_same_day_events_stack_in_input_order() {
        let segments = vec![seg(0, 3, 2, 3), seg(1, 3, 2, 3), seg(2, 3, 2, 3)];

        let pass = assign_lanes(segments, 5);

        let lanes: Vec<_> = pass
            .placed
            .iter()
            .map(|p| (p.segment.event_index, p.lane))
            .collect();
        assert_eq!(lanes, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(pass.lanes_used, 3);
        assert_eq!(pass.dropped, 0);
    }

    #[test]
    fn test_lane_is_reused_after_segment_ends() {
        let segments = vec![seg(0, 0, 0, 2), seg(1, 0, 1, 4), seg(2, 0, 2, 3)];

        let pass = assign_lanes(segments, 5);

        let lanes: Vec<_> = pass.placed.iter().map(|p| p.lane).collect();
        assert_eq!(lanes, vec![0, 1, 0]);
        assert_eq!(pass.lanes_used, 2);
    }

    #[test]
    fn test_sorted_by_start_before_packing() {
        let segments = vec![seg(0, 0, 4, 6), seg(1, 0, 0, 3)];

        let pass = assign_lanes(segments, 1);

        assert_eq!(pass.placed.len(), 2);
        assert!(pass.placed.iter().all(|p| p.lane == 0));
        assert_eq!(pass.placed[0].segment.event_index, 1);
    }

    #[test]
    fn test_rows_pack_independently() {
        let segments = vec![seg(0, 0, 0, 7), seg(0, 1, 0, 2), seg(1, 0, 3, 4)];

        let pass = assign_lanes(segments, 3);

        let row1 = pass.placed.iter().find(|p| p.segment.row == 1).unwrap();
        assert_eq!(row1.lane, 0);
        assert_eq!(pass.lanes_used, 2);
    }

    #[test]
    fn test_overflow_segments_are_dropped() {
        let segments = vec![
            seg(0, 0, 0, 1),
            seg(1, 0, 0, 1),
            seg(2, 0, 0, 1),
            seg(3, 0, 1, 2),
        ];

        let pass = assign_lanes(segments, 2);

        assert_eq!(pass.dropped, 1);
        assert_eq!(pass.placed.len(), 3);
        // the later segment still finds lane 0 free
        let last = pass.placed.iter().find(|p| p.segment.event_index == 3).unwrap();
        assert_eq!(last.lane, 0);
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let pass = assign_lanes(vec![seg(0, 0, 0, 1)], 0);
        assert!(pass.placed.is_empty());
        assert_eq!(pass.dropped, 1);
    }

    #[test]
    fn test_max_lanes_for() {
        assert_eq!(max_lanes_for(49.0, 18.0, 12.0), 2);
        assert_eq!(max_lanes_for(30.0, 18.0, 12.0), 1);
        assert_eq!(max_lanes_for(10.0, 18.0, 12.0), 0);
        assert_eq!(max_lanes_for(49.0, 18.0, 0.0), 0);
    }
}
