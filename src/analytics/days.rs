//! Calendar-day grouping of sets

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::sets::WorkoutSet;

/// All sets of one exercise on one local calendar day, chronological
#[derive(Debug, Clone)]
pub struct Day<'a> {
    pub date: NaiveDate,
    pub sets: Vec<&'a WorkoutSet>,
}

/// Local calendar day of a timestamp
pub fn local_date(ts: &DateTime<Utc>, tz: &FixedOffset) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Group sets by local day; each bucket sorted by timestamp
pub fn group_by_day<'a, I>(sets: I, tz: &FixedOffset) -> BTreeMap<NaiveDate, Vec<&'a WorkoutSet>>
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    let mut by_day: BTreeMap<NaiveDate, Vec<&WorkoutSet>> = BTreeMap::new();

    for set in sets {
        by_day.entry(local_date(&set.timestamp, tz)).or_default().push(set);
    }
    for day_sets in by_day.values_mut() {
        day_sets.sort_by_key(|s| s.timestamp);
    }

    by_day
}

/// Days ordered newest first
pub fn days_descending<'a, I>(sets: I, tz: &FixedOffset) -> Vec<Day<'a>>
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    group_by_day(sets, tz)
        .into_iter()
        .rev()
        .map(|(date, sets)| Day { date, sets })
        .collect()
}

/// Sets on a single local day, chronological
pub fn sets_on<'a, I>(sets: I, tz: &FixedOffset, date: NaiveDate) -> Vec<&'a WorkoutSet>
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    let mut day: Vec<_> = sets
        .into_iter()
        .filter(|s| local_date(&s.timestamp, tz) == date)
        .collect();
    day.sort_by_key(|s| s.timestamp);
    day
}
