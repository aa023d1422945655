use log::debug;

use crate::core::GenericResult;
use crate::metrics::{ChartDescriptor, ChartResult, ChartType, SeriesMeta, YUnit};
use crate::query::{Aggregation, AggregationKind, Filter, MetricsFetcher, MetricsRequest};
use crate::types::RequestScope;

pub const FAAS_BILLED_DURATION: &str = "faas.billed_duration";
pub const FAAS_ID: &str = "faas.id";
pub const METRICSET_NAME: &str = "metricset.name";

pub const BILLED_DURATION_KEY: &str = "billed_duration_avg";
const OPERATION_NAME: &str = "get_billed_duration";

pub fn chart_descriptor() -> ChartDescriptor {
    ChartDescriptor {
        title: "Lambda Duration".to_owned(),
        key: "avg_duration".to_owned(),
        chart_type: ChartType::Linemark,
        y_unit: YUnit::Time,
        description: concat!(
            "Transaction duration is the time spent processing and responding to a request. ",
            "If the request is queued it will not contribute to the transaction duration but will ",
            "contribute the overall billed duration",
        ).to_owned(),
        series: vec![SeriesMeta {
            key: BILLED_DURATION_KEY.to_owned(),
            title: "Billed Duration".to_owned(),
        }],
    }
}

pub fn billed_duration_request(scope: &RequestScope) -> MetricsRequest {
    let mut filters = vec![Filter::Exists {field: FAAS_BILLED_DURATION}];

    if let Some(serverless_id) = scope.serverless_id.as_ref() {
        filters.push(Filter::Term {field: FAAS_ID, value: serverless_id.clone()});
    }

    filters.push(Filter::Term {field: METRICSET_NAME, value: "app".to_owned()});

    MetricsRequest {
        descriptor: chart_descriptor(),
        aggregations: vec![Aggregation {
            name: BILLED_DURATION_KEY.to_owned(),
            kind: AggregationKind::Avg,
            field: FAAS_BILLED_DURATION,
        }],
        filters,
        operation_name: OPERATION_NAME,
    }
}

/// Fetches the average billed duration chart. Values are in milliseconds.
pub async fn fetch_billed_duration(scope: &RequestScope, fetcher: &dyn MetricsFetcher) -> GenericResult<ChartResult> {
    debug!("Fetching billed duration of {:?} (serverless id: {:?})...", scope.service_name, scope.serverless_id);
    fetcher.fetch_and_transform_metrics(scope, billed_duration_request(scope)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::testutil::scope;

    use super::*;

    struct RecordingFetcher {
        requests: Mutex<Vec<(Vec<Filter>, Vec<Aggregation>, &'static str)>>,
    }

    #[async_trait]
    impl MetricsFetcher for RecordingFetcher {
        async fn fetch_and_transform_metrics(&self, _scope: &RequestScope, request: MetricsRequest) -> GenericResult<ChartResult> {
            self.requests.lock().unwrap().push((request.filters, request.aggregations, request.operation_name));
            Ok(request.descriptor.to_chart())
        }
    }

    #[test]
    fn request_with_serverless_id() {
        let request = billed_duration_request(&scope(Some("arn:aws:lambda:us-west-2:123:function:checkout")));

        assert_eq!(request.filters, vec![
            Filter::Exists {field: "faas.billed_duration"},
            Filter::Term {field: "faas.id", value: "arn:aws:lambda:us-west-2:123:function:checkout".to_owned()},
            Filter::Term {field: "metricset.name", value: "app".to_owned()},
        ]);
        assert_eq!(request.aggregations, vec![Aggregation {
            name: "billed_duration_avg".to_owned(),
            kind: AggregationKind::Avg,
            field: "faas.billed_duration",
        }]);
        assert_eq!(request.operation_name, "get_billed_duration");
    }

    #[test]
    fn request_without_serverless_id() {
        let request = billed_duration_request(&scope(None));

        assert_eq!(request.filters, vec![
            Filter::Exists {field: "faas.billed_duration"},
            Filter::Term {field: "metricset.name", value: "app".to_owned()},
        ]);
    }

    #[test]
    fn descriptor() {
        let descriptor = chart_descriptor();

        assert_eq!(descriptor.key, "avg_duration");
        assert_eq!(descriptor.chart_type, ChartType::Linemark);
        assert_eq!(descriptor.y_unit, YUnit::Time);
        assert_eq!(descriptor.series.len(), 1);
        assert_eq!(descriptor.series[0].key, BILLED_DURATION_KEY);
    }

    #[tokio::test]
    async fn fetch_passes_request_through() {
        let fetcher = RecordingFetcher {requests: Mutex::new(Vec::new())};

        let chart = fetch_billed_duration(&scope(Some("checkout")), &fetcher).await.unwrap();
        assert_eq!(chart.title, "Lambda Duration");

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.len(), 3);
        assert_eq!(requests[0].2, "get_billed_duration");
    }
}
