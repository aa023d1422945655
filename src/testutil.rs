use chrono::{TimeZone, Utc};

use crate::types::{DocumentType, Environment, RequestScope, RollupInterval};

pub fn scope(serverless_id: Option<&str>) -> RequestScope {
    RequestScope {
        environment: Environment::All,
        kuery: String::new(),
        service_name: "checkout-lambda".to_owned(),
        transaction_type: None,
        start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        serverless_id: serverless_id.map(ToOwned::to_owned),
        document_type: DocumentType::TransactionEvent,
        rollup_interval: RollupInterval::None,
        bucket_size_secs: 60,
    }
}
