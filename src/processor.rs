use std::io::{self, Write};

use log::info;
use url::Url;

use crate::chart::get_serverless_latency_chart;
use crate::core::EmptyResult;
use crate::report;
use crate::search::SearchClient;
use crate::types::RequestScope;

pub struct Output {
    pub table: bool,
}

pub struct Indices {
    pub metrics: String,
    pub traces: String,
}

#[tokio::main(flavor = "current_thread")]
pub async fn process(url: &Url, indices: &Indices, scope: &RequestScope, output: &Output) -> EmptyResult {
    info!("Building latency chart for {:?} ({} - {}, {}s buckets)...",
        scope.service_name, scope.start, scope.end, scope.bucket_size_secs);

    let client = SearchClient::new(url, &indices.metrics, &indices.traces)?;
    let chart = get_serverless_latency_chart(scope, &client, &client).await?;

    if output.table {
        report::print(&chart);
    } else {
        let mut stdout = io::stdout();
        serde_json::to_writer_pretty(&mut stdout, &chart).map_err(|e| format!(
            "Failed to serialize the chart: {e}"))?;
        writeln!(stdout)?;
    }

    Ok(())
}
