//! Dashboard API client implementation.
//!
//! Every endpoint method follows the same procedure: validate arguments,
//! report the estimated query cost, then issue one cached GET request.

use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::cache::{self, ResponseCache};
use crate::cost::{self, CostReporter};
use crate::error::DashboardError;
use crate::models::{
    CompositionProperty, EventsQuery, FunnelQuery, LtvQuery, PropertyMetricsQuery, RetentionMode,
    RetentionQuery, RevenueQuery, UserCountQuery,
};
use crate::resources::{Segment, SegmentFilter};
use crate::validate;

/// Base URL for the Amplitude Dashboard API.
const API_BASE_URL: &str = "https://amplitude.com/api/2/";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API credentials for one Amplitude project.
#[derive(Debug, Clone)]
pub struct ProjectCredentials {
    api_key: String,
    secret_key: String,
}

impl ProjectCredentials {
    /// Create credentials from an API key and secret key pair.
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read credentials from the `AMPLITUDE_API_KEY` and
    /// `AMPLITUDE_SECRET_KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is not set.
    pub fn from_env() -> Result<Self, DashboardError> {
        let api_key = std::env::var("AMPLITUDE_API_KEY").map_err(|_| {
            DashboardError::Auth("AMPLITUDE_API_KEY environment variable not set".to_owned())
        })?;
        let secret_key = std::env::var("AMPLITUDE_SECRET_KEY").map_err(|_| {
            DashboardError::Auth("AMPLITUDE_SECRET_KEY environment variable not set".to_owned())
        })?;
        Ok(Self::new(api_key, secret_key))
    }

    /// The project API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Client for the Amplitude Dashboard REST API.
///
/// One instance per project; each endpoint method issues at most one GET
/// request, authenticated with HTTP Basic auth, and returns the parsed
/// JSON body. Responses are cached briefly per instance, keyed by URL,
/// parameters, and credentials.
pub struct DashboardClient {
    http: Client,
    credentials: ProjectCredentials,
    base_url: Url,
    cost_reporter: Option<CostReporter>,
    cache: Mutex<ResponseCache>,
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("cost_reporter", &self.cost_reporter.as_ref().map(|_| "<fn>"))
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl DashboardClient {
    /// Create a client against the public Dashboard API.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are empty or the HTTP client
    /// cannot be created.
    pub fn new(credentials: ProjectCredentials) -> Result<Self, DashboardError> {
        Self::with_base_url(credentials, API_BASE_URL)
    }

    /// Create a client against a different base URL, e.g. a regional
    /// deployment or a test server.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are empty, the base URL does
    /// not parse, or the HTTP client cannot be created.
    pub fn with_base_url(
        credentials: ProjectCredentials,
        base_url: impl AsRef<str>,
    ) -> Result<Self, DashboardError> {
        if credentials.api_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(DashboardError::Auth(
                "Amplitude API key and secret key are required".to_owned(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        let mut base_url = Url::parse(base_url.as_ref())?;
        // A trailing slash keeps the API prefix when joining endpoint paths.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            http,
            credentials,
            base_url,
            cost_reporter: None,
            cache: Mutex::new(ResponseCache::default()),
        })
    }

    /// Install a callback receiving the estimated cost of each query
    /// before it is issued. Without a reporter no cost is computed.
    #[must_use]
    pub fn cost_reporter(mut self, reporter: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.cost_reporter = Some(Box::new(reporter));
        self
    }

    /// Replace the response cache with one of the given capacity and TTL.
    #[must_use]
    pub fn cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache = Mutex::new(ResponseCache::new(capacity, ttl));
        self
    }

    /// Get the number of active or new users over a date range.
    #[instrument(skip(self, query))]
    pub async fn get_active_and_new_user_count(
        &self,
        query: UserCountQuery<'_>,
    ) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::segments(query.segments)?;
        validate::group_by(query.segments, query.group_by)?;
        self.report_cost(start, end, "users", query.segments, query.group_by.len(), 1);

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("m", query.metric.as_param().to_owned()),
            ("i", query.interval.as_param().to_owned()),
        ];
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }
        for prop in query.group_by {
            params.push(("g", (*prop).to_owned()));
        }

        self.request("users", &params).await
    }

    /// Get the number of sessions in each predefined length bucket over a
    /// date range.
    #[instrument(skip(self))]
    pub async fn get_session_length_distribution(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Value, DashboardError> {
        let (start_date, end_date) = validate::date_range(start, end)?;
        self.report_cost(start_date, end_date, "sessions", &[], 0, 1);

        let params = [("start", start.to_owned()), ("end", end.to_owned())];
        self.request("sessions/length", &params).await
    }

    /// Get the average session length in seconds for each day in the
    /// range.
    #[instrument(skip(self))]
    pub async fn get_average_session_length(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Value, DashboardError> {
        let (start_date, end_date) = validate::date_range(start, end)?;
        self.report_cost(start_date, end_date, "sessions", &[], 0, 1);

        let params = [("start", start.to_owned()), ("end", end.to_owned())];
        self.request("sessions/average", &params).await
    }

    /// Get the average number of sessions per user for each day in the
    /// range.
    #[instrument(skip(self))]
    pub async fn get_average_session_per_user(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Value, DashboardError> {
        let (start_date, end_date) = validate::date_range(start, end)?;
        self.report_cost(start_date, end_date, "sessions", &[], 0, 1);

        let params = [("start", start.to_owned()), ("end", end.to_owned())];
        self.request("sessions/peruser", &params).await
    }

    /// Chart an aggregation of event property values for one or two
    /// events.
    #[instrument(skip(self, query))]
    pub async fn get_property_metrics(
        &self,
        query: PropertyMetricsQuery<'_>,
    ) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::event_pair(query.events)?;
        validate::segments(query.segments)?;
        self.report_cost(
            start,
            end,
            "events/segmentation",
            query.segments,
            0,
            query.events.len() as u64,
        );

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("m", query.metric.as_param().to_owned()),
            ("i", query.interval.as_param().to_owned()),
        ];
        params.push(("e", query.events[0].definition()));
        if let Some(second) = query.events.get(1) {
            params.push(("e2", second.definition()));
        }
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }

        self.request("events/segmentation", &params).await
    }

    /// Get totals, uniques, averages, or DAU percentage for one or two
    /// events at once.
    #[instrument(skip(self, query))]
    pub async fn get_events(&self, query: EventsQuery<'_>) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::event_pair(query.events)?;
        validate::segments(query.segments)?;
        // The group-by term comes from the first event's own group-bys.
        let group_by_count = query.events.first().map_or(0, |e| e.group_by_props().len());
        self.report_cost(
            start,
            end,
            "events/segmentation",
            query.segments,
            group_by_count,
            query.events.len() as u64,
        );

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("m", query.metric.as_param().to_owned()),
            ("i", query.interval.as_param().to_owned()),
            ("limit", query.limit.to_string()),
        ];
        params.push(("e", query.events[0].definition()));
        if let Some(second) = query.events.get(1) {
            params.push(("e2", second.definition()));
        }
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }

        self.request("events/segmentation", &params).await
    }

    /// Get the distribution of users across the values of a user property
    /// in the date range.
    #[instrument(skip(self, properties))]
    pub async fn get_user_composition(
        &self,
        start: &str,
        end: &str,
        properties: &[CompositionProperty],
    ) -> Result<Value, DashboardError> {
        let (start_date, end_date) = validate::date_range(start, end)?;
        validate::composition_properties(properties)?;
        self.report_cost(start_date, end_date, "composition", &[], 0, 1);

        let mut params: Vec<(&str, String)> =
            vec![("start", start.to_owned()), ("end", end.to_owned())];
        for prop in properties {
            params.push(("p", prop.as_param()));
        }

        self.request("composition", &params).await
    }

    /// Get the list of events with the current week's totals, uniques,
    /// and DAU.
    #[instrument(skip(self))]
    pub async fn get_event_list(&self) -> Result<Value, DashboardError> {
        self.request("events/list", &[]).await
    }

    /// Get a user summary and their most recent events.
    ///
    /// `offset` is the zero-indexed event to start from; `limit` caps the
    /// number of events returned (up to 1000).
    #[instrument(skip(self))]
    pub async fn get_user_activity(
        &self,
        user: &str,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Value, DashboardError> {
        let mut params: Vec<(&str, String)> = vec![("user", user.to_owned())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        self.request("useractivity", &params).await
    }

    /// Search for a user by Amplitude ID, device ID, user ID, or user ID
    /// prefix.
    #[instrument(skip(self))]
    pub async fn get_user_search(&self, user: &str) -> Result<Value, DashboardError> {
        let params = [("user", user.to_owned())];
        self.request("usersearch", &params).await
    }

    /// Get active user counts with minute granularity for the last two
    /// days. The realtime chart only offers the 5-minute interval.
    #[instrument(skip(self))]
    pub async fn get_realtime_active_users(&self) -> Result<Value, DashboardError> {
        let params = [("i", "5".to_owned())];
        self.request("realtime", &params).await
    }

    /// Get revenue metrics per day, week, or month.
    #[instrument(skip(self, query))]
    pub async fn get_revenue_analysis(
        &self,
        query: RevenueQuery<'_>,
    ) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::segments(query.segments)?;
        validate::group_by(query.segments, query.group_by)?;
        // Revenue cost conditions count only the group-by term.
        self.report_cost(start, end, "revenue", &[], query.group_by.len(), 1);

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("m", query.metric.as_param().to_owned()),
            ("i", query.interval.as_param().to_owned()),
        ];
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }
        for prop in query.group_by {
            params.push(("g", (*prop).to_owned()));
        }

        self.request("revenue/day", &params).await
    }

    /// Get the lifetime value of new users.
    #[instrument(skip(self, query))]
    pub async fn get_revenue_ltv(&self, query: LtvQuery<'_>) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::segments(query.segments)?;
        validate::group_by(query.segments, query.group_by)?;
        // Revenue cost conditions count only the group-by term.
        self.report_cost(start, end, "revenue", &[], query.group_by.len(), 1);

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("m", query.metric.as_param().to_owned()),
            ("i", query.interval.as_param().to_owned()),
        ];
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }
        for prop in query.group_by {
            params.push(("g", (*prop).to_owned()));
        }

        self.request("revenue/ltv", &params).await
    }

    /// Get user retention for specific starting and returning actions.
    #[instrument(skip(self, query))]
    pub async fn get_retention(
        &self,
        query: RetentionQuery<'_>,
    ) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::segments(query.segments)?;
        let group_by: &[&str] = match &query.group_by {
            Some(prop) => std::slice::from_ref(prop),
            None => &[],
        };
        validate::group_by(query.segments, group_by)?;
        self.report_cost(start, end, "retention", query.segments, group_by.len(), 1);

        let mut params: Vec<(&str, String)> = vec![
            ("se", query.start_event.definition()),
            ("re", query.return_event.definition()),
        ];
        // n-day is the chart's default mode and is not sent explicitly.
        match query.mode {
            RetentionMode::NDay => {}
            mode => params.push(("rm", mode.as_param().to_owned())),
        }
        params.push(("start", query.start.to_owned()));
        params.push(("end", query.end.to_owned()));
        params.push(("i", query.interval.as_param().to_owned()));
        if let RetentionMode::Bracket { from_day, to_day } = query.mode {
            params.push(("rb", format!("[{from_day},{to_day}]")));
        }
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }
        if let Some(prop) = query.group_by {
            params.push(("g", prop.to_owned()));
        }

        self.request("retention", &params).await
    }

    /// Get funnel drop-off and conversion rates.
    #[instrument(skip(self, query))]
    pub async fn get_funnel(&self, query: FunnelQuery<'_>) -> Result<Value, DashboardError> {
        let (start, end) = validate::date_range(query.start, query.end)?;
        validate::funnel_steps(query.steps)?;
        validate::segments(query.segments)?;
        let group_by: &[&str] = match &query.group_by {
            Some(prop) => std::slice::from_ref(prop),
            None => &[],
        };
        validate::group_by(query.segments, group_by)?;
        self.report_cost(
            start,
            end,
            "funnels",
            query.segments,
            group_by.len(),
            query.steps.len() as u64,
        );

        let mut params: Vec<(&str, String)> = vec![
            ("start", query.start.to_owned()),
            ("end", query.end.to_owned()),
            ("mode", query.mode.as_param().to_owned()),
            ("n", query.user_set.as_param().to_owned()),
            ("cs", query.conversion_window_secs.to_string()),
        ];
        for step in query.steps {
            params.push(("e", step.definition()));
        }
        if !query.segments.is_empty() {
            params.push(("s", segments_param(query.segments)));
        }
        if let Some(prop) = query.group_by {
            params.push(("g", prop.to_owned()));
        }

        self.request("funnels", &params).await
    }

    /// Get the annotations configured in the project.
    #[instrument(skip(self))]
    pub async fn get_annotations(&self) -> Result<Value, DashboardError> {
        self.request("annotations", &[]).await
    }

    /// Hand the estimated cost of the upcoming query to the reporter, if
    /// one is installed.
    fn report_cost(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        endpoint: &str,
        segments: &[Segment],
        group_by_count: usize,
        event_multiplier: u64,
    ) {
        if let Some(reporter) = &self.cost_reporter {
            let cost =
                cost::query_cost(start, end, endpoint, segments, group_by_count) * event_multiplier;
            debug!(endpoint, cost, "estimated query cost");
            reporter(cost);
        }
    }

    /// Issue a cached GET request and parse the response body as JSON.
    async fn request(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, DashboardError> {
        let url = self.base_url.join(path)?;
        let key = cache::request_key(url.as_str(), params, self.credentials.api_key());

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(value) = cache.get(&key) {
                debug!(url = %url, "returning cached response");
                return Ok(value);
            }
        }

        debug!(url = %url, "GET request");
        let mut request = self
            .http
            .get(url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.secret_key));
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DashboardError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "failed to parse response body");
            DashboardError::Serialization(e)
        })?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value.clone());
        }
        Ok(value)
    }
}

/// The `s` parameter: one flat JSON array holding every filter clause of
/// every supplied segment.
fn segments_param(segments: &[Segment]) -> String {
    let filters: Vec<&SegmentFilter> = segments.iter().flat_map(Segment::filters).collect();
    serde_json::to_string(&filters).unwrap_or_else(|_| String::from("[]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::FilterOp;

    fn credentials() -> ProjectCredentials {
        ProjectCredentials::new("api-key", "secret-key")
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = DashboardClient::new(ProjectCredentials::new("", "secret")).unwrap_err();
        assert!(matches!(err, DashboardError::Auth(_)));

        let err = DashboardClient::new(ProjectCredentials::new("key", "")).unwrap_err();
        assert!(matches!(err, DashboardError::Auth(_)));
    }

    #[test]
    fn test_with_base_url_rejects_garbage() {
        let err = DashboardClient::with_base_url(credentials(), "not a url").unwrap_err();
        assert!(matches!(err, DashboardError::BaseUrl(_)));
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let client =
            DashboardClient::with_base_url(credentials(), "https://eu.amplitude.com/api/2")
                .unwrap();
        assert_eq!(client.base_url.path(), "/api/2/");
        assert_eq!(
            client.base_url.join("users").unwrap().as_str(),
            "https://eu.amplitude.com/api/2/users"
        );
    }

    #[test]
    fn test_segments_param_flattens_filters() {
        let segments = vec![
            Segment::new("us").filter("country", FilterOp::Is, ["US"]),
            Segment::new("mobile").filter("platform", FilterOp::Is, ["iOS"]),
        ];
        assert_eq!(
            segments_param(&segments),
            r#"[{"prop":"country","op":"is","values":["US"]},{"prop":"platform","op":"is","values":["iOS"]}]"#
        );
    }
}
