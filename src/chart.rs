use log::debug;

use crate::billed_duration::fetch_billed_duration;
use crate::core::GenericResult;
use crate::metrics::{ChartResult, Series};
use crate::query::{LatencyTimeseriesSource, MetricsFetcher};
use crate::transaction_latency::fetch_transaction_duration;
use crate::types::RequestScope;

// Billed duration is stored in milliseconds while the chart is in microseconds
const MICROS_PER_MILLI: f64 = 1000.0;

/// Builds the serverless function latency chart: billed duration next to the observed transaction duration.
///
/// Both sources are queried concurrently. If either of them fails, the whole chart fails.
pub async fn get_serverless_latency_chart(
    scope: &RequestScope, metrics: &dyn MetricsFetcher, latency: &dyn LatencyTimeseriesSource,
) -> GenericResult<ChartResult> {
    let (billed_duration, transaction_duration) = tokio::try_join!(
        fetch_billed_duration(scope, metrics),
        fetch_transaction_duration(scope, latency),
    )?;

    let chart = merge(billed_duration, transaction_duration);
    debug!("Got {} series for {:?} chart.", chart.series.len(), chart.key);

    Ok(chart)
}

fn merge(billed_duration: ChartResult, transaction_duration: Vec<Series>) -> ChartResult {
    let mut series = Vec::with_capacity(2);

    if let Some(billed_duration) = billed_duration.series.into_iter().next() {
        series.push(billed_duration.scaled(MICROS_PER_MILLI));
    }

    if transaction_duration.first().is_some_and(|transaction_duration| !transaction_duration.data.is_empty()) {
        series.extend(transaction_duration);
    }

    ChartResult {series, ..billed_duration}
}
