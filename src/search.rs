use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{self, Client, ClientBuilder};
use serde_derive::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::core::GenericResult;
use crate::metrics::{series_color, ChartDescriptor, ChartResult, Series, SeriesPoint};
use crate::query::{Filter, LatencyTimeseries, LatencyTimeseriesSource, MetricsFetcher, MetricsRequest};
use crate::types::{DocumentType, Environment, RequestScope};

const TIMESTAMP: &str = "@timestamp";
const SERVICE_NAME: &str = "service.name";
const SERVICE_ENVIRONMENT: &str = "service.environment";
const PROCESSOR_EVENT: &str = "processor.event";
const TRANSACTION_TYPE: &str = "transaction.type";
const TRANSACTION_DURATION: &str = "transaction.duration.us";
const TRANSACTION_DURATION_HISTOGRAM: &str = "transaction.duration.histogram";
const METRICSET_NAME: &str = "metricset.name";
const METRICSET_INTERVAL: &str = "metricset.interval";
const FAAS_ID: &str = "faas.id";

const TIMESERIES_AGGREGATION: &str = "timeseries";
const LATENCY_AGGREGATION: &str = "latency";
const OVERALL_LATENCY_AGGREGATION: &str = "overall_avg_duration";
const LATENCY_OPERATION_NAME: &str = "get_latency_charts";

/// Runs metric and latency queries against an Elasticsearch-compatible search API.
pub struct SearchClient {
    client: Client,
    url: Url,
    metrics_index: String,
    traces_index: String,
}

impl SearchClient {
    pub fn new(url: &Url, metrics_index: &str, traces_index: &str) -> GenericResult<SearchClient> {
        Ok(SearchClient {
            client: new_client()?,
            url: url.clone(),
            metrics_index: metrics_index.to_owned(),
            traces_index: traces_index.to_owned(),
        })
    }

    async fn search(&self, index: &str, operation_name: &str, query: &Value) -> GenericResult<SearchResponse> {
        let search_url = self.url.join(&format!("{index}/_search")).map_err(|e| format!(
            "Invalid URL: {e}"))?;

        debug!("{operation_name}: {search_url}: {query}");

        let response = self.client.post(search_url)
            .header("X-Opaque-Id", operation_name)
            .json(query)
            .send().await.map_err(|e| {
                if e.is_connect() {
                    format!("Failed to establish connection to {}: {e}", self.url)
                } else {
                    format!("Search request error: {e}")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err!("The server returned an error on {operation_name} ({status}): {}", message.trim());
        }

        let response: SearchResponse = response.json().await.map_err(|e| format!(
            "Got an invalid {operation_name} response: {e}"))?;
        trace!("{operation_name}: {response:?}");

        Ok(response)
    }
}

#[async_trait]
impl MetricsFetcher for SearchClient {
    async fn fetch_and_transform_metrics(&self, scope: &RequestScope, request: MetricsRequest) -> GenericResult<ChartResult> {
        let query = metrics_query(scope, &request);
        let response = self.search(&self.metrics_index, request.operation_name, &query).await?;
        Ok(transform_metrics(&request.descriptor, response.aggregations))
    }
}

#[async_trait]
impl LatencyTimeseriesSource for SearchClient {
    async fn latency_timeseries(&self, scope: &RequestScope) -> GenericResult<LatencyTimeseries> {
        let index = match scope.document_type {
            DocumentType::TransactionEvent => &self.traces_index,
            DocumentType::TransactionMetric => &self.metrics_index,
        };

        let query = latency_query(scope);
        let response = self.search(index, LATENCY_OPERATION_NAME, &query).await?;

        Ok(transform_latency(response.aggregations))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    aggregations: Option<Aggregations>,
}

#[derive(Debug, Deserialize)]
struct Aggregations {
    #[serde(default)]
    timeseries: Option<DateHistogram>,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

impl Aggregations {
    fn points(&self, name: &str) -> Vec<SeriesPoint> {
        self.timeseries.as_ref().map(|timeseries| {
            timeseries.buckets.iter().map(|bucket| SeriesPoint {
                x: bucket.key,
                y: aggregation_value(&bucket.values, name),
            }).collect()
        }).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct DateHistogram {
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    key: i64,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

fn aggregation_value(values: &HashMap<String, Value>, name: &str) -> Option<f64> {
    values.get(name).and_then(|aggregation| aggregation.get("value")).and_then(Value::as_f64)
}

fn metrics_query(scope: &RequestScope, request: &MetricsRequest) -> Value {
    let mut filters = scope_filters(scope);
    filters.push(term(PROCESSOR_EVENT, "metric"));
    filters.extend(request.filters.iter().map(filter_query));

    let aggregations: serde_json::Map<String, Value> = request.aggregations.iter().map(|aggregation| {
        (aggregation.name.clone(), json!({aggregation.kind.name(): {"field": aggregation.field}}))
    }).collect();

    let mut query_aggregations = aggregations.clone();
    query_aggregations.insert(TIMESERIES_AGGREGATION.to_owned(), json!({
        "date_histogram": date_histogram(scope),
        "aggs": aggregations,
    }));

    json!({
        "size": 0,
        "track_total_hits": false,
        "query": {"bool": {"filter": filters}},
        "aggs": query_aggregations,
    })
}

fn transform_metrics(descriptor: &ChartDescriptor, aggregations: Option<Aggregations>) -> ChartResult {
    let mut chart = descriptor.to_chart();

    chart.series = descriptor.series.iter().enumerate().map(|(index, meta)| Series {
        title: meta.title.clone(),
        key: meta.key.clone(),
        chart_type: descriptor.chart_type,
        color: series_color(index).to_owned(),
        overall_value: aggregations.as_ref()
            .and_then(|aggregations| aggregation_value(&aggregations.values, &meta.key))
            .unwrap_or(0.0),
        data: aggregations.as_ref().map(|aggregations| aggregations.points(&meta.key)).unwrap_or_default(),
    }).collect();

    chart
}

fn latency_query(scope: &RequestScope) -> Value {
    let mut filters = scope_filters(scope);

    let duration_field = match scope.document_type {
        DocumentType::TransactionEvent => {
            filters.push(term(PROCESSOR_EVENT, "transaction"));
            TRANSACTION_DURATION
        },
        DocumentType::TransactionMetric => {
            filters.push(term(METRICSET_NAME, "transaction"));
            filters.push(json!({"exists": {"field": TRANSACTION_DURATION_HISTOGRAM}}));
            if let Some(interval) = scope.rollup_interval.metricset_interval() {
                filters.push(term(METRICSET_INTERVAL, interval));
            }
            TRANSACTION_DURATION_HISTOGRAM
        },
    };

    if let Some(transaction_type) = scope.transaction_type.as_ref() {
        filters.push(term(TRANSACTION_TYPE, transaction_type));
    }

    if let Some(serverless_id) = scope.serverless_id.as_ref() {
        filters.push(term(FAAS_ID, serverless_id));
    }

    let average = json!({"avg": {"field": duration_field}});

    json!({
        "size": 0,
        "track_total_hits": false,
        "query": {"bool": {"filter": filters}},
        "aggs": {
            OVERALL_LATENCY_AGGREGATION: average,
            TIMESERIES_AGGREGATION: {
                "date_histogram": date_histogram(scope),
                "aggs": {LATENCY_AGGREGATION: average},
            },
        },
    })
}

fn transform_latency(aggregations: Option<Aggregations>) -> LatencyTimeseries {
    let Some(aggregations) = aggregations else {
        return LatencyTimeseries::default();
    };

    LatencyTimeseries {
        overall_avg_duration: aggregation_value(&aggregations.values, OVERALL_LATENCY_AGGREGATION),
        latency_timeseries: aggregations.points(LATENCY_AGGREGATION),
    }
}

fn scope_filters(scope: &RequestScope) -> Vec<Value> {
    let mut filters = vec![term(SERVICE_NAME, &scope.service_name)];

    match &scope.environment {
        Environment::All => {},
        Environment::NotDefined => filters.push(json!({
            "bool": {"must_not": [{"exists": {"field": SERVICE_ENVIRONMENT}}]},
        })),
        Environment::Named(name) => filters.push(term(SERVICE_ENVIRONMENT, name)),
    }

    if !scope.kuery.trim().is_empty() {
        filters.push(json!({"query_string": {"query": scope.kuery}}));
    }

    filters.push(json!({"range": {TIMESTAMP: {
        "gte": scope.start.timestamp_millis(),
        "lt": scope.end.timestamp_millis(),
        "format": "epoch_millis",
    }}}));

    filters
}

fn date_histogram(scope: &RequestScope) -> Value {
    json!({
        "field": TIMESTAMP,
        "fixed_interval": format!("{}s", scope.bucket_size_secs),
        "min_doc_count": 0,
        "extended_bounds": {
            "min": scope.start.timestamp_millis(),
            "max": scope.end.timestamp_millis(),
        },
    })
}

fn filter_query(filter: &Filter) -> Value {
    match filter {
        Filter::Exists {field} => json!({"exists": {"field": field}}),
        Filter::Term {field, value} => term(field, value),
    }
}

fn term(field: &str, value: &str) -> Value {
    json!({"term": {field: value}})
}

fn new_client() -> GenericResult<Client> {
    Ok(ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}
