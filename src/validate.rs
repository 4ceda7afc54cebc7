//! Request argument validation.
//!
//! Every check fails with [`DashboardError::InvalidArgument`] before any
//! network activity; no partial results are ever returned.

use chrono::NaiveDate;

use crate::error::DashboardError;
use crate::models::CompositionProperty;
use crate::resources::{Event, Segment};

const DATE_FORMAT: &str = "%Y%m%d";

/// Parse and check a start/end date pair.
///
/// Both must be exactly 8 ASCII digits forming a valid `YYYYMMDD` calendar
/// date, and `end` must not precede `start`.
pub(crate) fn date_range(
    start: &str,
    end: &str,
) -> Result<(NaiveDate, NaiveDate), DashboardError> {
    let parse = |raw: &str| -> Result<NaiveDate, DashboardError> {
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DashboardError::InvalidArgument(format!(
                "date `{raw}` must be 8 digits in YYYYMMDD format"
            )));
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
            DashboardError::InvalidArgument(format!("date `{raw}` is not a calendar date: {e}"))
        })
    };

    let start_date = parse(start)?;
    let end_date = parse(end)?;
    if end_date < start_date {
        return Err(DashboardError::InvalidArgument(format!(
            "end date {end} precedes start date {start}"
        )));
    }
    Ok((start_date, end_date))
}

/// Check that every supplied segment is well-formed: at least one filter
/// clause, none of them with an empty property name. An empty slice means
/// "no segments" and is always valid.
pub(crate) fn segments(segments: &[Segment]) -> Result<(), DashboardError> {
    for segment in segments {
        if segment.filter_count() == 0 {
            return Err(DashboardError::InvalidArgument(format!(
                "segment `{}` has no filter clauses",
                segment.name()
            )));
        }
        if segment.filters().iter().any(|f| f.prop.is_empty()) {
            return Err(DashboardError::InvalidArgument(format!(
                "segment `{}` has a filter with an empty property name",
                segment.name()
            )));
        }
    }
    Ok(())
}

/// Check the group-by/segment coupling: every group-by property must be
/// referenced by at least one filter of at least one supplied segment, and
/// grouping with no segments at all is an error.
pub(crate) fn group_by(segments: &[Segment], group_by: &[&str]) -> Result<(), DashboardError> {
    if group_by.is_empty() {
        return Ok(());
    }
    if segments.is_empty() {
        return Err(DashboardError::InvalidArgument(
            "cannot group by without a segment definition".to_owned(),
        ));
    }
    for prop in group_by {
        let referenced = segments
            .iter()
            .any(|s| s.filters().iter().any(|f| f.prop == *prop));
        if !referenced {
            return Err(DashboardError::InvalidArgument(format!(
                "group-by property `{prop}` is not referenced by any segment filter"
            )));
        }
    }
    Ok(())
}

/// Segmentation charts take one or two events.
pub(crate) fn event_pair(events: &[Event]) -> Result<(), DashboardError> {
    if events.is_empty() || events.len() > 2 {
        return Err(DashboardError::InvalidArgument(format!(
            "expected 1 or 2 events, got {}",
            events.len()
        )));
    }
    Ok(())
}

/// A funnel needs at least one step.
pub(crate) fn funnel_steps(steps: &[Event]) -> Result<(), DashboardError> {
    if steps.is_empty() {
        return Err(DashboardError::InvalidArgument(
            "a funnel requires at least one event".to_owned(),
        ));
    }
    Ok(())
}

/// Custom composition properties must carry a property name.
pub(crate) fn composition_properties(
    properties: &[CompositionProperty],
) -> Result<(), DashboardError> {
    for prop in properties {
        if let CompositionProperty::Custom(name) = prop {
            if name.is_empty() {
                return Err(DashboardError::InvalidArgument(
                    "custom composition property name must not be empty".to_owned(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::FilterOp;

    fn country_segment() -> Segment {
        Segment::new("us").filter("country", FilterOp::Is, ["United States"])
    }

    #[test]
    fn test_date_range_accepts_valid_pairs() {
        assert!(date_range("20200101", "20200107").is_ok());
        assert!(date_range("20200229", "20200229").is_ok());
    }

    #[test]
    fn test_date_range_rejects_end_before_start() {
        let err = date_range("20200107", "20200101").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidArgument(_)));
    }

    #[test]
    fn test_date_range_rejects_non_numeric() {
        assert!(date_range("2020-1-1", "20200107").is_err());
        assert!(date_range("20200101", "2020010a").is_err());
        assert!(date_range("202001", "20200107").is_err());
    }

    #[test]
    fn test_date_range_rejects_impossible_dates() {
        // 8 digits, but not a calendar date.
        assert!(date_range("20200230", "20200301").is_err());
        assert!(date_range("20201301", "20201302").is_err());
    }

    #[test]
    fn test_segments_rejects_empty_definition() {
        let err = segments(&[Segment::new("empty")]).unwrap_err();
        assert!(err.to_string().contains("no filter clauses"));
    }

    #[test]
    fn test_segments_rejects_empty_property_name() {
        let bad = Segment::new("bad").filter("", FilterOp::Is, ["x"]);
        assert!(segments(&[bad]).is_err());
    }

    #[test]
    fn test_segments_accepts_absent_list() {
        assert!(segments(&[]).is_ok());
    }

    #[test]
    fn test_group_by_requires_segments() {
        let err = group_by(&[], &["country"]).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidArgument(_)));
    }

    #[test]
    fn test_group_by_rejects_unreferenced_property() {
        // The property is missing from every filter, no matter how many
        // segments are supplied.
        let segs = vec![
            country_segment(),
            Segment::new("ios").filter("platform", FilterOp::Is, ["iOS"]),
        ];
        let err = group_by(&segs, &["city"]).unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_group_by_accepts_referenced_property() {
        let segs = vec![country_segment()];
        assert!(group_by(&segs, &["country"]).is_ok());
    }

    #[test]
    fn test_event_pair_bounds() {
        let one = vec![Event::new("a")];
        let two = vec![Event::new("a"), Event::new("b")];
        let three = vec![Event::new("a"), Event::new("b"), Event::new("c")];

        assert!(event_pair(&[]).is_err());
        assert!(event_pair(&one).is_ok());
        assert!(event_pair(&two).is_ok());
        assert!(event_pair(&three).is_err());
    }

    #[test]
    fn test_funnel_steps_must_not_be_empty() {
        assert!(funnel_steps(&[]).is_err());
        assert!(funnel_steps(&[Event::new("signup")]).is_ok());
    }

    #[test]
    fn test_composition_custom_property_needs_name() {
        assert!(composition_properties(&[CompositionProperty::Custom(String::new())]).is_err());
        assert!(
            composition_properties(&[CompositionProperty::Custom("age".to_owned())]).is_ok()
        );
    }
}
