//! Year-bounded tag sampling
//!
//! Selects at most `max_per_year` tags from each calendar year so that years
//! with many point releases do not dominate the series. Within a year the
//! selection is the *first* entries in input order, not a spread across the
//! year. Callers relying on representativeness should know this is a prefix.

use std::collections::BTreeMap;

use chrono::Datelike;
use log::debug;

use crate::extraction::tags::VersionTag;

/// Sample tags per calendar year
///
/// Years are emitted in ascending order; within a year the input order is
/// kept and only the first `max_per_year` entries survive. `None` keeps every
/// tag of every year.
pub fn sample_by_year(tags: &[VersionTag], max_per_year: Option<usize>) -> Vec<VersionTag> {
    let mut by_year: BTreeMap<i32, Vec<&VersionTag>> = BTreeMap::new();
    for tag in tags {
        by_year.entry(tag.release_date.year()).or_default().push(tag);
    }

    let mut selected = Vec::with_capacity(tags.len());
    for (year, bucket) in by_year {
        let take = max_per_year.map_or(bucket.len(), |max| max.min(bucket.len()));
        debug!("Year {}: keeping {} of {} tags", year, take, bucket.len());
        selected.extend(bucket.into_iter().take(take).cloned());
    }

    selected
}
