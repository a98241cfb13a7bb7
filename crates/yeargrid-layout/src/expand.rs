//! Per-day membership of events.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::event::AllDayEvent;

/// Events covering each date, in input order.
pub type DateMap<'a> = HashMap<NaiveDate, Vec<&'a AllDayEvent>>;

/// Put every event into the bucket of each date in `[start_date, end_date)`.
pub fn expand_to_date_map(events: &[AllDayEvent]) -> DateMap<'_> {
    let mut map: DateMap<'_> = HashMap::new();
    for event in events {
        for date in event.dates() {
            map.entry(date).or_default().push(event);
        }
    }
    map
}

/// Events on `date`, empty when there are none.
pub fn events_on<'m, 'a>(map: &'m DateMap<'a>, date: NaiveDate) -> &'m [&'a AllDayEvent] {
    map.get(&date).map(Vec::as_slice).unwrap_or(&[])
}

pub fn has_events(map: &DateMap<'_>, date: NaiveDate) -> bool {
    map.get(&date).is_some_and(|v| !v.is_empty())
}
