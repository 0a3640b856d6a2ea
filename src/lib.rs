//! # covid-dashboard
//!
//! COVID-19 France dashboard: national cases with a short-horizon forecast,
//! a department map of 14-day totals and reproduction number, and detail
//! charts driven by map interactions.
//!
//! ## Modules
//!
//! - [`data`]: input loaders and data sources
//! - [`analysis`]: rolling window sums and the Rt estimator
//! - [`forecast`]: forecast providers
//! - [`prepare`]: plot-data preparation into a `Dataset`
//! - [`render`]: Plotly figures and risk colors
//! - [`controller`]: interaction state machine
//! - [`service`]: refresh-on-demand dataset holder
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use covid_dashboard::analysis::estimate_rt;
//! use covid_dashboard::data::DailySeries;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2020, 9, 1).unwrap();
//! let cases = DailySeries::from_values(start, (0..42).map(|d| 100.0 + d as f64));
//! let rt = estimate_rt(&cases, 14).unwrap();
//!
//! println!("Latest Rt: {:?}", rt.last());
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod controller;
pub mod data;
pub mod forecast;
pub mod prepare;
pub mod render;
pub mod service;

// Re-export top-level types for convenience
pub use analysis::{estimate_rt, rolling_sum, AnalysisError, RtTable, DEFAULT_WINDOW_DAYS};

pub use data::{DailySeries, DataError, DataSource, RegionNames, RegionalTable};

pub use prepare::{Dataset, PrepareError, Snapshot, SnapshotRow};

pub use controller::{
    select_view, transition, DetailView, GraphMode, InteractionEvent, InteractionState, MapButton,
    Scope,
};

pub use render::{Figure, RenderError, RiskLevel};

pub use service::{DashboardService, RefreshOutcome, ServiceError};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError};
