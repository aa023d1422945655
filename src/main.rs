#[macro_use] mod core;
mod billed_duration;
mod chart;
mod metrics;
mod processor;
mod query;
mod report;
mod search;
mod transaction_latency;
mod types;

#[cfg(test)] mod testutil;

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::{Arg, ArgAction, Command, value_parser};
use easy_logging::LoggingConfig;
use log::{Level, error};
use url::Url;

use crate::core::GenericResult;
use crate::processor::{Indices, Output};
use crate::types::{DocumentType, Environment, RequestScope, RollupInterval};

fn main() -> ExitCode {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err}.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = LoggingConfig::new(module_path!(), config.log_level).minimal().build() {
        let _ = writeln!(io::stderr(), "Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    let default_panic_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic_hook(info);
        std::process::abort();
    }));

    if let Err(err) = processor::process(&config.url, &config.indices, &config.scope, &config.output) {
        error!("{err}.");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

struct Config {
    url: Url,
    indices: Indices,
    scope: RequestScope,
    output: Output,
    log_level: Level,
}

fn parse_args() -> GenericResult<Config> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))

        .dont_collapse_args_in_usage(true)
        .disable_help_subcommand(true)
        .help_expected(true)

        .args([
            Arg::new("verbose")
                .short('v').long("verbose")
                .action(ArgAction::Count)
                .help("Set verbosity level"),

            Arg::new("url")
                .value_name("URL")
                .required(true)
                .value_parser(value_parser!(Url))
                .help("Search API URL"),

            Arg::new("service")
                .short('s').long("service")
                .value_name("NAME")
                .required(true)
                .help("Service name"),

            Arg::new("serverless-id")
                .long("serverless-id")
                .value_name("ID")
                .help("Serverless function ID"),

            Arg::new("environment")
                .short('e').long("environment")
                .value_name("NAME")
                .default_value(types::ENVIRONMENT_ALL)
                .value_parser(value_parser!(Environment))
                .help("Service environment"),

            Arg::new("kuery")
                .short('q').long("kuery")
                .value_name("QUERY")
                .default_value("")
                .help("Additional filter query"),

            Arg::new("transaction-type")
                .long("transaction-type")
                .value_name("TYPE")
                .help("Transaction type"),

            Arg::new("start")
                .long("start")
                .value_name("TIME")
                .value_parser(value_parser!(DateTime<Utc>))
                .help("Time window start (RFC 3339, one hour before the end by default)"),

            Arg::new("end")
                .long("end")
                .value_name("TIME")
                .value_parser(value_parser!(DateTime<Utc>))
                .help("Time window end (RFC 3339, now by default)"),

            Arg::new("bucket-size")
                .long("bucket-size")
                .value_name("SECONDS")
                .value_parser(value_parser!(i64).range(1..))
                .help("Bucket size (chosen automatically by default)"),

            Arg::new("document-type")
                .long("document-type")
                .value_name("TYPE")
                .default_value("event")
                .value_parser(value_parser!(DocumentType))
                .help("Transaction documents to compute latency from: event or metric"),

            Arg::new("rollup-interval")
                .long("rollup-interval")
                .value_name("INTERVAL")
                .default_value("none")
                .value_parser(value_parser!(RollupInterval))
                .help("Transaction metrics rollup interval: none, 1m, 10m or 60m"),

            Arg::new("metrics-index")
                .long("metrics-index")
                .value_name("INDEX")
                .default_value("metrics-apm*")
                .help("Metrics index pattern"),

            Arg::new("traces-index")
                .long("traces-index")
                .value_name("INDEX")
                .default_value("traces-apm*")
                .help("Traces index pattern"),

            Arg::new("table")
                .short('t').long("table")
                .action(ArgAction::SetTrue)
                .help("Print the chart as a table instead of JSON"),
        ])

        .get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => Level::Info,
        1 => Level::Debug,
        2 => Level::Trace,
        _ => return Err!("Invalid verbosity level"),
    };

    let end = matches.get_one::<DateTime<Utc>>("end").cloned().unwrap_or_else(Utc::now);
    let start = matches.get_one::<DateTime<Utc>>("start").cloned().unwrap_or(end - Duration::hours(1));
    if start >= end {
        return Err!("Invalid time window: {start} - {end}");
    }

    let scope = RequestScope {
        environment: matches.get_one::<Environment>("environment").cloned().unwrap(),
        kuery: matches.get_one::<String>("kuery").cloned().unwrap_or_default(),
        service_name: matches.get_one::<String>("service").cloned().unwrap(),
        transaction_type: matches.get_one::<String>("transaction-type").cloned(),
        start,
        end,
        serverless_id: matches.get_one::<String>("serverless-id").cloned(),
        document_type: *matches.get_one::<DocumentType>("document-type").unwrap(),
        rollup_interval: *matches.get_one::<RollupInterval>("rollup-interval").unwrap(),
        bucket_size_secs: matches.get_one::<i64>("bucket-size").cloned()
            .unwrap_or_else(|| types::bucket_size_for(start, end)),
    };

    Ok(Config {
        url: matches.get_one("url").cloned().unwrap(),
        indices: Indices {
            metrics: matches.get_one::<String>("metrics-index").cloned().unwrap(),
            traces: matches.get_one::<String>("traces-index").cloned().unwrap(),
        },
        scope,
        output: Output {
            table: matches.get_flag("table"),
        },
        log_level,
    })
}
