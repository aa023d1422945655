use log::debug;

use crate::core::GenericResult;
use crate::metrics::{is_finite_number, series_color, ChartType, Series};
use crate::query::{LatencyTimeseries, LatencyTimeseriesSource};
use crate::types::RequestScope;

pub const TRANSACTION_DURATION_KEY: &str = "transaction_duration";

pub async fn fetch_transaction_duration(scope: &RequestScope, source: &dyn LatencyTimeseriesSource) -> GenericResult<Vec<Series>> {
    debug!("Fetching {:?} transaction latency of {:?}...", scope.document_type, scope.service_name);
    let latency = source.latency_timeseries(scope).await?;
    Ok(vec![transaction_duration_series(latency)])
}

fn transaction_duration_series(latency: LatencyTimeseries) -> Series {
    let overall_value = match latency.overall_avg_duration {
        Some(value) if is_finite_number(latency.overall_avg_duration) => value,
        _ => 0.0,
    };

    Series {
        title: "Transaction Duration".to_owned(),
        key: TRANSACTION_DURATION_KEY.to_owned(),
        chart_type: ChartType::Linemark,
        color: series_color(1).to_owned(),
        overall_value,
        data: latency.latency_timeseries,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::metrics::SeriesPoint;
    use crate::testutil::scope;

    use super::*;

    struct StaticSource(LatencyTimeseries);

    #[async_trait]
    impl LatencyTimeseriesSource for StaticSource {
        async fn latency_timeseries(&self, _scope: &RequestScope) -> GenericResult<LatencyTimeseries> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn adaptation() {
        let data = vec![SeriesPoint {x: 1000, y: Some(500.0)}, SeriesPoint {x: 2000, y: None}];
        let source = StaticSource(LatencyTimeseries {
            overall_avg_duration: Some(500.0),
            latency_timeseries: data.clone(),
        });

        let series = fetch_transaction_duration(&scope(None), &source).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].title, "Transaction Duration");
        assert_eq!(series[0].key, "transaction_duration");
        assert_eq!(series[0].overall_value, 500.0);
        assert_eq!(series[0].data, data);
    }

    #[test]
    fn missing_average() {
        for overall_avg_duration in [None, Some(f64::NAN), Some(f64::NEG_INFINITY)] {
            let series = transaction_duration_series(LatencyTimeseries {
                overall_avg_duration,
                latency_timeseries: Vec::new(),
            });
            assert_eq!(series.overall_value, 0.0);
            assert!(series.data.is_empty());
        }
    }
}
