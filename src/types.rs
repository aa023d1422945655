use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::core::GenericError;

pub const ENVIRONMENT_ALL: &str = "ENVIRONMENT_ALL";
pub const ENVIRONMENT_NOT_DEFINED: &str = "ENVIRONMENT_NOT_DEFINED";

const MAX_BUCKETS: i64 = 100;
const BUCKET_SIZES: [i64; 13] = [1, 5, 10, 30, 60, 300, 600, 1800, 3600, 3 * 3600, 6 * 3600, 12 * 3600, 24 * 3600];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    All,
    NotDefined,
    Named(String),
}

impl FromStr for Environment {
    type Err = GenericError;

    fn from_str(value: &str) -> Result<Environment, GenericError> {
        Ok(match value {
            "" => return Err!("Empty environment name"),
            ENVIRONMENT_ALL => Environment::All,
            ENVIRONMENT_NOT_DEFINED => Environment::NotDefined,
            name => Environment::Named(name.to_owned()),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentType {
    TransactionEvent,
    TransactionMetric,
}

impl FromStr for DocumentType {
    type Err = GenericError;

    fn from_str(value: &str) -> Result<DocumentType, GenericError> {
        Ok(match value {
            "event" => DocumentType::TransactionEvent,
            "metric" => DocumentType::TransactionMetric,
            _ => return Err!("Invalid document type: {value:?}"),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollupInterval {
    None,
    OneMinute,
    TenMinutes,
    SixtyMinutes,
}

impl RollupInterval {
    /// The `metricset.interval` value of documents stored with this rollup.
    pub fn metricset_interval(self) -> Option<&'static str> {
        match self {
            RollupInterval::None => None,
            RollupInterval::OneMinute => Some("1m"),
            RollupInterval::TenMinutes => Some("10m"),
            RollupInterval::SixtyMinutes => Some("60m"),
        }
    }
}

impl FromStr for RollupInterval {
    type Err = GenericError;

    fn from_str(value: &str) -> Result<RollupInterval, GenericError> {
        Ok(match value {
            "none" => RollupInterval::None,
            "1m" => RollupInterval::OneMinute,
            "10m" => RollupInterval::TenMinutes,
            "60m" => RollupInterval::SixtyMinutes,
            _ => return Err!("Invalid rollup interval: {value:?}"),
        })
    }
}

/// Query-shaping parameters shared read-only by both fetchers of a single chart request.
#[derive(Clone, Debug)]
pub struct RequestScope {
    pub environment: Environment,
    pub kuery: String,
    pub service_name: String,
    pub transaction_type: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub serverless_id: Option<String>,
    pub document_type: DocumentType,
    pub rollup_interval: RollupInterval,
    pub bucket_size_secs: i64,
}

/// Picks the smallest bucket size that keeps the window within the bucket limit.
pub fn bucket_size_for(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let duration = (end - start).num_seconds().max(1);

    for size in BUCKET_SIZES {
        if (duration + size - 1) / size <= MAX_BUCKETS {
            return size;
        }
    }

    BUCKET_SIZES[BUCKET_SIZES.len() - 1]
}
