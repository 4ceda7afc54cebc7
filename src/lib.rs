//! Client for the Amplitude Dashboard REST API.
//!
//! This crate builds query parameters for the Dashboard API's analytics
//! endpoints (user counts, session metrics, event segmentation, funnels,
//! retention, revenue, user search/activity, annotations), estimates the
//! query cost the service will charge against the project's rate budget,
//! caches identical requests briefly, and returns the parsed JSON
//! response.
//!
//! Each endpoint method follows the same procedure:
//!
//! > validate arguments -> report the query cost -> issue one cached GET
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use amplitude_dashboard::{
//!     DashboardClient, ProjectCredentials, UserCountQuery, UserSet,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), amplitude_dashboard::DashboardError> {
//!     // Create a client from environment variables
//!     let client = DashboardClient::new(ProjectCredentials::from_env()?)?;
//!
//!     // Daily active users over a week
//!     let counts = client
//!         .get_active_and_new_user_count(UserCountQuery {
//!             start: "20200101",
//!             end: "20200107",
//!             metric: UserSet::Active,
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("{counts}");
//!     Ok(())
//! }
//! ```
//!
//! ## Segments and group-by
//!
//! Queries can be restricted to a user subset and bucketed by a property
//! that appears in one of the segment filters:
//!
//! ```rust,ignore
//! use amplitude_dashboard::{FilterOp, Segment, UserCountQuery};
//!
//! let segments = vec![
//!     Segment::new("us-paying")
//!         .filter("country", FilterOp::Is, ["United States"])
//!         .filter("paying", FilterOp::Is, ["true"]),
//! ];
//!
//! let counts = client
//!     .get_active_and_new_user_count(UserCountQuery {
//!         start: "20200101",
//!         end: "20200107",
//!         segments: &segments,
//!         group_by: &["country"],
//!         ..Default::default()
//!     })
//!     .await?;
//! ```
//!
//! ## Query cost
//!
//! The service throttles on `days x query-type cost x conditions`. Install
//! a reporter to see each query's estimate before it is sent:
//!
//! ```rust,ignore
//! let client = DashboardClient::new(credentials)?
//!     .cost_reporter(|cost| println!("estimated query cost: {cost}"));
//! ```
//!
//! ## Execution model
//!
//! Every method issues at most one GET request and resolves before the
//! caller proceeds; there is no retry, backoff, rate limiting, or
//! pagination. Identical requests within a short window are served from a
//! per-client response cache (one entry for 60 seconds by default, see
//! [`cache::ResponseCache`]).

pub mod cache;
pub mod client;
pub mod cost;
pub mod error;
pub mod models;
pub mod resources;
mod validate;

pub use client::{DashboardClient, ProjectCredentials};
pub use cost::CostReporter;
pub use error::DashboardError;
pub use models::{
    CompositionProperty, CountInterval, EventMetric, EventsQuery, FunnelMode, FunnelQuery,
    Interval, LtvMetric, LtvQuery, PropertyMetric, PropertyMetricsQuery, RetentionMode,
    RetentionQuery, RevenueMetric, RevenueQuery, UserCountQuery, UserSet,
};
pub use resources::{Conjunction, Event, FilterOp, Segment, SegmentFilter};
