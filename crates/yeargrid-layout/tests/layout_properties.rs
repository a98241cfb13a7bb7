// Property tests for the year-grid layout pipeline.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use yeargrid_layout::{
    assign_lanes, best_grid_dimensions, compute_layout, expand_to_date_map, index_by_day_key,
    is_leap_year, segment_events, year_days, AllDayEvent, LayoutMetrics, Viewport,
};

fn event_strategy(year: i32) -> impl Strategy<Value = Vec<AllDayEvent>> {
    // starts range a little outside the year so boundary events show up
    prop::collection::vec((-20i64..390, 1i64..40), 0..40).prop_map(move |specs| {
        let base = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
        specs
            .into_iter()
            .enumerate()
            .filter_map(|(i, (offset, len))| {
                let start = base + Duration::days(offset);
                AllDayEvent::new(
                    format!("e{i}"),
                    "cal",
                    format!("event {i}"),
                    start,
                    start + Duration::days(len),
                )
            })
            .collect()
    })
}

proptest! {
    /// Every year has 365 or 366 consecutive days starting on January 1st.
    #[test]
    fn prop_year_days_are_consecutive(year in 1900..2200i32) {
        let days = year_days(year);
        let expected = if is_leap_year(year) { 366 } else { 365 };
        prop_assert_eq!(days.len(), expected);
        prop_assert_eq!(days[0].date, NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
        for pair in days.windows(2) {
            prop_assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
            prop_assert_eq!(pair[0].index + 1, pair[1].index);
        }
    }

    /// The grid is never wider than the viewport, and fits the height unless
    /// flagged as overflowing.
    #[test]
    fn prop_grid_fits_viewport(
        width in 1..2500i32,
        height in 1..2500i32,
        gap in 0..4u32,
        days in 365..=366usize,
    ) {
        let dims = best_grid_dimensions(days, width, height, gap);
        prop_assert!(dims.columns >= 1);
        prop_assert!(dims.columns <= days);
        prop_assert!(dims.cell_size_px >= 1);
        prop_assert!(dims.rendered_width(gap) <= width as u64);
        prop_assert!(dims.overflows || dims.rendered_height(gap) <= height as u64);
        prop_assert_eq!(dims.rows, days.div_ceil(dims.columns));
    }

    /// Placed segments never share a lane where they overlap, and every
    /// segment is either placed or counted as dropped.
    #[test]
    fn prop_lanes_never_overlap(
        events in event_strategy(2024),
        columns in 1..40usize,
        max_lanes in 0..6usize,
    ) {
        let days = year_days(2024);
        let index = index_by_day_key(&days);
        let pass = segment_events(&events, &index, columns);
        let total = pass.segments.len();

        let lanes = assign_lanes(pass.segments, max_lanes);
        prop_assert_eq!(lanes.placed.len() + lanes.dropped, total);
        prop_assert!(lanes.lanes_used <= max_lanes);

        for (i, a) in lanes.placed.iter().enumerate() {
            prop_assert!(a.lane < max_lanes);
            prop_assert!(a.segment.end_col <= columns);
            for b in &lanes.placed[i + 1..] {
                if a.lane == b.lane {
                    prop_assert!(!a.segment.overlaps(&b.segment));
                }
            }
        }
    }

    /// Segments of an in-year event cover exactly its days.
    #[test]
    fn prop_segments_cover_event_days(events in event_strategy(2023), columns in 1..40usize) {
        let days = year_days(2023);
        let index = index_by_day_key(&days);
        let pass = segment_events(&events, &index, columns);

        let mut covered = 0usize;
        for event in &events {
            let in_year = index.get(event.start_date).is_some()
                && index.resolve_end(event.end_date).is_some();
            let span: usize = pass
                .segments
                .iter()
                .filter(|s| s.event_id == event.id)
                .map(|s| s.span())
                .sum();
            if in_year {
                prop_assert_eq!(span as i64, event.span_days());
                covered += 1;
            } else {
                prop_assert_eq!(span, 0);
            }
        }
        prop_assert_eq!(covered + pass.skipped_events, events.len());
    }

    /// Expansion puts each event on each of its dates exactly once.
    #[test]
    fn prop_expansion_matches_ranges(events in event_strategy(2024)) {
        let map = expand_to_date_map(&events);
        let total: usize = map.values().map(Vec::len).sum();
        let expected: i64 = events.iter().map(AllDayEvent::span_days).sum();
        prop_assert_eq!(total as i64, expected);

        for event in &events {
            for date in event.dates() {
                prop_assert!(map[&date].iter().any(|e| e.id == event.id));
            }
        }
    }

    /// Same inputs, same layout.
    #[test]
    fn prop_layout_is_deterministic(
        events in event_strategy(2024),
        width in 0..1600i32,
        height in 0..1000i32,
    ) {
        let viewport = Viewport::new(width, height);
        let metrics = LayoutMetrics::default();
        let first = compute_layout(2024, &events, viewport, &metrics, None, None);
        let second = compute_layout(2024, &events, viewport, &metrics, None, None);
        prop_assert_eq!(first, second);
    }
}
