//! Request parameter types for the Dashboard API endpoints.
//!
//! Mode and metric parameters are plain enums carrying their wire values,
//! so an out-of-range value cannot be expressed; the remote service's own
//! validation stays the authority for everything the types cannot check.

use serde::{Deserialize, Serialize};

use crate::resources::{Event, Segment};

/// Which users a chart considers: everyone active, or new users only.
///
/// Used as the `m` parameter of the users chart and the `n` parameter of
/// funnels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSet {
    #[default]
    Active,
    New,
}

impl UserSet {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::New => "new",
        }
    }
}

/// Bucket interval for daily, weekly, or monthly series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Daily => "1",
            Self::Weekly => "7",
            Self::Monthly => "30",
        }
    }
}

/// Bucket interval for the users chart, which additionally offers the two
/// realtime granularities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountInterval {
    /// 5-minute buckets.
    FiveMinutes,
    /// Hourly buckets.
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl CountInterval {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::FiveMinutes => "-300000",
            Self::Hourly => "-3600000",
            Self::Daily => "1",
            Self::Weekly => "7",
            Self::Monthly => "30",
        }
    }
}

/// Metric returned by the event segmentation chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMetric {
    #[default]
    Totals,
    Uniques,
    Avg,
    PctDau,
    Sums,
}

impl EventMetric {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Totals => "totals",
            Self::Uniques => "uniques",
            Self::Avg => "avg",
            Self::PctDau => "pct_dau",
            Self::Sums => "sums",
        }
    }
}

/// Aggregation applied to event property values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMetric {
    Histogram,
    #[default]
    Sums,
    ValueAvg,
}

impl PropertyMetric {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Sums => "sums",
            Self::ValueAvg => "value_avg",
        }
    }
}

/// Metric returned by the daily revenue chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueMetric {
    #[default]
    Total,
    Paying,
    Arpu,
    Arppu,
}

impl RevenueMetric {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Paying => "paying",
            Self::Arpu => "arpu",
            Self::Arppu => "arppu",
        }
    }
}

/// Metric returned by the revenue LTV chart. The API takes these as
/// numeric codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LtvMetric {
    #[default]
    Arpu,
    Arppu,
    TotalRevenue,
    PayingUsers,
}

impl LtvMetric {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Arpu => "0",
            Self::Arppu => "1",
            Self::TotalRevenue => "2",
            Self::PayingUsers => "3",
        }
    }
}

/// Retention type. `NDay` is the chart's default and is never sent
/// explicitly; `Bracket` carries its day bounds, sent as `[from,to)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionMode {
    #[default]
    NDay,
    /// Unbounded (rolling) retention.
    Rolling,
    /// Bracket retention over the half-open day range `[from_day, to_day)`.
    Bracket { from_day: u32, to_day: u32 },
}

impl RetentionMode {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::NDay => "n-day",
            Self::Rolling => "rolling",
            Self::Bracket { .. } => "bracket",
        }
    }
}

/// Whether funnel steps must occur in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelMode {
    #[default]
    Ordered,
    Unordered,
}

impl FunnelMode {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Unordered => "unordered",
        }
    }
}

/// User property the composition chart distributes over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionProperty {
    Version,
    Country,
    City,
    Region,
    Dma,
    Language,
    Platform,
    Os,
    Device,
    StartVersion,
    Paying,
    /// Custom user property, sent with the `gp:` prefix.
    Custom(String),
}

impl CompositionProperty {
    pub(crate) fn as_param(&self) -> String {
        match self {
            Self::Version => "version".to_owned(),
            Self::Country => "country".to_owned(),
            Self::City => "city".to_owned(),
            Self::Region => "region".to_owned(),
            Self::Dma => "DMA".to_owned(),
            Self::Language => "language".to_owned(),
            Self::Platform => "platform".to_owned(),
            Self::Os => "os".to_owned(),
            Self::Device => "device".to_owned(),
            Self::StartVersion => "start_version".to_owned(),
            Self::Paying => "paying".to_owned(),
            Self::Custom(name) => {
                if name.starts_with("gp:") {
                    name.clone()
                } else {
                    format!("gp:{name}")
                }
            }
        }
    }
}

/// Query for [`DashboardClient::get_active_and_new_user_count`].
///
/// [`DashboardClient::get_active_and_new_user_count`]: crate::DashboardClient::get_active_and_new_user_count
#[derive(Debug, Clone, Default)]
pub struct UserCountQuery<'a> {
    /// First date in the series, formatted `YYYYMMDD`.
    pub start: &'a str,
    /// Last date in the series, formatted `YYYYMMDD`.
    pub end: &'a str,
    /// Count active or new users.
    pub metric: UserSet,
    pub interval: CountInterval,
    /// Segments restricting the counted users.
    pub segments: &'a [Segment],
    /// Properties to bucket the counts by; each must be referenced by a
    /// filter of a supplied segment.
    pub group_by: &'a [&'a str],
}

/// Query for [`DashboardClient::get_property_metrics`].
///
/// [`DashboardClient::get_property_metrics`]: crate::DashboardClient::get_property_metrics
#[derive(Debug, Clone, Default)]
pub struct PropertyMetricsQuery<'a> {
    pub start: &'a str,
    pub end: &'a str,
    /// One or two events to chart.
    pub events: &'a [Event],
    pub metric: PropertyMetric,
    pub interval: Interval,
    pub segments: &'a [Segment],
}

/// Query for [`DashboardClient::get_events`].
///
/// [`DashboardClient::get_events`]: crate::DashboardClient::get_events
#[derive(Debug, Clone)]
pub struct EventsQuery<'a> {
    pub start: &'a str,
    pub end: &'a str,
    /// One or two events to chart.
    pub events: &'a [Event],
    pub metric: EventMetric,
    pub interval: Interval,
    pub segments: &'a [Segment],
    /// Maximum number of series returned.
    pub limit: u32,
}

impl Default for EventsQuery<'_> {
    fn default() -> Self {
        Self {
            start: "",
            end: "",
            events: &[],
            metric: EventMetric::default(),
            interval: Interval::default(),
            segments: &[],
            limit: 1000,
        }
    }
}

/// Query for [`DashboardClient::get_revenue_analysis`].
///
/// [`DashboardClient::get_revenue_analysis`]: crate::DashboardClient::get_revenue_analysis
#[derive(Debug, Clone, Default)]
pub struct RevenueQuery<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub metric: RevenueMetric,
    pub interval: Interval,
    pub segments: &'a [Segment],
    pub group_by: &'a [&'a str],
}

/// Query for [`DashboardClient::get_revenue_ltv`].
///
/// [`DashboardClient::get_revenue_ltv`]: crate::DashboardClient::get_revenue_ltv
#[derive(Debug, Clone, Default)]
pub struct LtvQuery<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub metric: LtvMetric,
    pub interval: Interval,
    pub segments: &'a [Segment],
    pub group_by: &'a [&'a str],
}

/// Query for [`DashboardClient::get_retention`].
///
/// [`DashboardClient::get_retention`]: crate::DashboardClient::get_retention
#[derive(Debug, Clone)]
pub struct RetentionQuery<'a> {
    /// Event for the starting action.
    pub start_event: &'a Event,
    /// Event for the returning action.
    pub return_event: &'a Event,
    pub start: &'a str,
    pub end: &'a str,
    pub mode: RetentionMode,
    pub interval: Interval,
    pub segments: &'a [Segment],
    /// Property to group by (the chart supports at most one).
    pub group_by: Option<&'a str>,
}

/// Query for [`DashboardClient::get_funnel`].
///
/// [`DashboardClient::get_funnel`]: crate::DashboardClient::get_funnel
#[derive(Debug, Clone)]
pub struct FunnelQuery<'a> {
    /// One event per funnel step, in order.
    pub steps: &'a [Event],
    pub start: &'a str,
    pub end: &'a str,
    pub mode: FunnelMode,
    /// Which users the funnel considers.
    pub user_set: UserSet,
    pub segments: &'a [Segment],
    /// Property to group by (the chart supports at most one).
    pub group_by: Option<&'a str>,
    /// Conversion window in seconds; rounded down to whole days by the
    /// service in unordered mode.
    pub conversion_window_secs: u64,
}

/// Default conversion window: 30 days.
const DEFAULT_CONVERSION_WINDOW_SECS: u64 = 2_592_000;

impl Default for FunnelQuery<'_> {
    fn default() -> Self {
        Self {
            steps: &[],
            start: "",
            end: "",
            mode: FunnelMode::default(),
            user_set: UserSet::default(),
            segments: &[],
            group_by: None,
            conversion_window_secs: DEFAULT_CONVERSION_WINDOW_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_wire_values() {
        assert_eq!(Interval::Daily.as_param(), "1");
        assert_eq!(Interval::Weekly.as_param(), "7");
        assert_eq!(Interval::Monthly.as_param(), "30");
        assert_eq!(CountInterval::FiveMinutes.as_param(), "-300000");
        assert_eq!(CountInterval::Hourly.as_param(), "-3600000");
    }

    #[test]
    fn test_metric_wire_values() {
        assert_eq!(EventMetric::PctDau.as_param(), "pct_dau");
        assert_eq!(PropertyMetric::ValueAvg.as_param(), "value_avg");
        assert_eq!(RevenueMetric::Arppu.as_param(), "arppu");
        assert_eq!(LtvMetric::PayingUsers.as_param(), "3");
        assert_eq!(UserSet::New.as_param(), "new");
    }

    #[test]
    fn test_retention_mode_params() {
        assert_eq!(RetentionMode::NDay.as_param(), "n-day");
        assert_eq!(RetentionMode::Rolling.as_param(), "rolling");
        assert_eq!(
            RetentionMode::Bracket {
                from_day: 0,
                to_day: 5
            }
            .as_param(),
            "bracket"
        );
    }

    #[test]
    fn test_composition_property_params() {
        assert_eq!(CompositionProperty::Dma.as_param(), "DMA");
        assert_eq!(CompositionProperty::StartVersion.as_param(), "start_version");
        assert_eq!(
            CompositionProperty::Custom("age".to_owned()).as_param(),
            "gp:age"
        );
        // An already-prefixed name is passed through untouched.
        assert_eq!(
            CompositionProperty::Custom("gp:age".to_owned()).as_param(),
            "gp:age"
        );
    }

    #[test]
    fn test_events_query_default_limit() {
        let query = EventsQuery::default();
        assert_eq!(query.limit, 1000);
    }

    #[test]
    fn test_funnel_query_default_conversion_window() {
        let query = FunnelQuery::default();
        assert_eq!(query.conversion_window_secs, 2_592_000);
        assert_eq!(query.mode, FunnelMode::Ordered);
        assert_eq!(query.user_set, UserSet::Active);
    }
}
