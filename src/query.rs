use async_trait::async_trait;

use crate::core::GenericResult;
use crate::metrics::{ChartDescriptor, ChartResult, SeriesPoint};
use crate::types::RequestScope;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Exists {field: &'static str},
    Term {field: &'static str, value: String},
}

/// A named single-value aggregation. The name matches a series key of the chart descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    pub name: String,
    pub kind: AggregationKind,
    pub field: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregationKind {
    Avg,
}

impl AggregationKind {
    pub fn name(self) -> &'static str {
        match self {
            AggregationKind::Avg => "avg",
        }
    }
}

pub struct MetricsRequest {
    pub descriptor: ChartDescriptor,
    pub aggregations: Vec<Aggregation>,
    pub filters: Vec<Filter>,
    pub operation_name: &'static str,
}

/// Runs a metric aggregation query and turns its buckets into a chart with one series per descriptor series.
#[async_trait]
pub trait MetricsFetcher: Send + Sync {
    async fn fetch_and_transform_metrics(&self, scope: &RequestScope, request: MetricsRequest) -> GenericResult<ChartResult>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencyTimeseries {
    pub overall_avg_duration: Option<f64>,
    pub latency_timeseries: Vec<SeriesPoint>,
}

/// Averaged transaction latency in microseconds.
#[async_trait]
pub trait LatencyTimeseriesSource: Send + Sync {
    async fn latency_timeseries(&self, scope: &RequestScope) -> GenericResult<LatencyTimeseries>;
}
