//! Collectors polling the upstream prediction APIs.
//!
//! Each collector wraps one or more HTTP GET calls against a named
//! endpoint, normalizes the JSON response into an internal record shape,
//! and retains a bounded in-memory history of recent records for trend
//! summarization. Collection never raises: upstream failures become
//! records with `status: Error`.

pub mod classification;
pub mod forecasting;
mod history;
mod http;
pub mod rl;

pub use classification::{
    ClassificationCollector, ClassificationSummary, DefectAnalysis, QualityAnalysis,
    RiskAssessment,
};
pub use forecasting::{ForecastSummary, ForecastTrends, ForecastingCollector, parse_forecast_points};
pub use history::History;
pub use rl::{
    ActionConsensus, ConsensusAnalysis, FocusArea, ModelAnalysis, OptimizationInsights,
    RlCollector, RlSummary,
};
