//! Client-side query-cost estimation.
//!
//! The Dashboard API throttles callers on a per-query cost computed as
//!
//! ```text
//! cost = (# of days) x (cost for the query type) x (# of conditions)
//! ```
//!
//! This module reproduces that formula so callers can see the cost of a
//! query before it is issued. The number is advisory telemetry only: it is
//! handed to an optional [`CostReporter`] and never gates or throttles
//! anything.

use chrono::NaiveDate;

use crate::resources::Segment;

/// Callback receiving the estimated cost of a query before it is sent.
pub type CostReporter = Box<dyn Fn(u64) + Send + Sync>;

/// Cost multipliers per query type. Any endpoint not listed costs 1.
const ENDPOINT_COSTS: &[(&str, u64)] = &[
    ("events/segmentation", 1),
    ("funnels", 2),
    ("retention", 8),
    ("users", 4),
];

/// Number of days a query spans: the absolute day difference between the
/// two dates, counting equal dates as one day.
#[must_use]
pub fn number_of_days(start: NaiveDate, end: NaiveDate) -> u64 {
    (end - start).num_days().unsigned_abs().max(1)
}

/// Cost multiplier for a query type.
#[must_use]
pub fn endpoint_cost(endpoint: &str) -> u64 {
    ENDPOINT_COSTS
        .iter()
        .find(|(name, _)| *name == endpoint)
        .map_or(1, |(_, cost)| *cost)
}

/// Number of conditions: the segment count (one when no segments are
/// supplied) plus every filter clause inside them, with each group-by
/// property counting as four segments.
///
/// One segment with one filter and two group-bys yields 10.
#[must_use]
pub fn number_of_conditions(segments: &[Segment], group_by_count: usize) -> u64 {
    let segment_count = if segments.is_empty() {
        1
    } else {
        segments.len() as u64
    };
    let filter_count: u64 = segments.iter().map(|s| s.filter_count() as u64).sum();
    segment_count + filter_count + 4 * group_by_count as u64
}

/// Estimated cost of a single query.
#[must_use]
pub fn query_cost(
    start: NaiveDate,
    end: NaiveDate,
    endpoint: &str,
    segments: &[Segment],
    group_by_count: usize,
) -> u64 {
    number_of_days(start, end)
        * endpoint_cost(endpoint)
        * number_of_conditions(segments, group_by_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::FilterOp;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y%m%d").unwrap()
    }

    #[test]
    fn test_number_of_days_same_day_counts_as_one() {
        assert_eq!(number_of_days(date("20200101"), date("20200101")), 1);
    }

    #[test]
    fn test_number_of_days_is_exclusive_difference() {
        assert_eq!(number_of_days(date("20200101"), date("20200107")), 6);
        assert_eq!(number_of_days(date("20200101"), date("20200102")), 1);
        assert_eq!(number_of_days(date("20191231"), date("20200131")), 31);
    }

    #[test]
    fn test_endpoint_cost_table() {
        assert_eq!(endpoint_cost("events/segmentation"), 1);
        assert_eq!(endpoint_cost("funnels"), 2);
        assert_eq!(endpoint_cost("retention"), 8);
        assert_eq!(endpoint_cost("users"), 4);
    }

    #[test]
    fn test_endpoint_cost_defaults_to_one() {
        assert_eq!(endpoint_cost("sessions"), 1);
        assert_eq!(endpoint_cost("composition"), 1);
        assert_eq!(endpoint_cost("made-up"), 1);
    }

    #[test]
    fn test_funnel_cost_is_double_an_unlisted_endpoint() {
        let segs = vec![Segment::new("us").filter("country", FilterOp::Is, ["US"])];
        let funnel = query_cost(date("20200101"), date("20200110"), "funnels", &segs, 0);
        let other = query_cost(date("20200101"), date("20200110"), "sessions", &segs, 0);
        assert_eq!(funnel, 2 * other);
    }

    #[test]
    fn test_conditions_default_to_one_without_segments() {
        assert_eq!(number_of_conditions(&[], 0), 1);
    }

    #[test]
    fn test_conditions_count_segments_filters_and_group_bys() {
        // One segment, one filter, two group-bys: 1 + 1 + 4*2 = 10.
        let segs = vec![Segment::new("us").filter("country", FilterOp::Is, ["US"])];
        assert_eq!(number_of_conditions(&segs, 2), 10);

        let segs = vec![
            Segment::new("us").filter("country", FilterOp::Is, ["US"]),
            Segment::new("mobile")
                .filter("platform", FilterOp::Is, ["iOS"])
                .filter("version", FilterOp::GreaterOrEqual, ["2.0"]),
        ];
        assert_eq!(number_of_conditions(&segs, 0), 5);
    }

    #[test]
    fn test_group_by_without_segments_still_counts() {
        assert_eq!(number_of_conditions(&[], 1), 5);
    }

    #[test]
    fn test_query_cost_seven_day_user_count() {
        // 6 days x 4 (users) x 1 condition.
        let cost = query_cost(date("20200101"), date("20200107"), "users", &[], 0);
        assert_eq!(cost, 24);
    }
}
