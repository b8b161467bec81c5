//! Request payload construction. Field names and ids follow the inventory
//! service's JSON request schema.
use super::{ApiKey, Dataset};
use crate::error::ApiError;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const WRS_PATH_FIELD_ID: u32 = 21989;
pub const WRS_ROW_FIELD_ID: u32 = 19879;

/// Open set of request fields; the service decides which combinations are valid.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct RequestParams(Map<String, Value>);

impl RequestParams {
    /// Request carrying only the session key.
    pub fn with_api_key(api_key: &ApiKey) -> Self {
        let mut params = Self::default();
        params.set("apiKey", json!(api_key));
        params
    }

    /// Search request against one dataset.
    pub fn new(api_key: &ApiKey, dataset: Dataset, max_results: u64) -> Self {
        let mut params = Self::with_api_key(api_key);
        params.set("datasetName", json!(dataset.key()));
        params.set("maxResults", json!(max_results));
        params
    }

    pub fn set(self: &mut Self, key: &str, value: Value) -> &mut Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn get(self: &Self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Copies every top level field of `block` into the request.
    pub fn merge(self: &mut Self, block: Map<String, Value>) -> &mut Self {
        self.0.extend(block);
        self
    }

    /// An empty month list adds nothing.
    pub fn with_months(self: &mut Self, months: &[u32]) -> &mut Self {
        if !months.is_empty() {
            self.set("months", json!(months));
        }
        self
    }

    pub fn to_json(self: &Self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// `additionalCriteria` block constraining WRS path and row. Without either
/// the child list stays empty, which the service treats as no constraint.
pub fn additional_criteria(path: Option<u32>, row: Option<u32>) -> Map<String, Value> {
    let mut child_filters = vec![];
    if let Some(path) = path {
        child_filters.push(value_filter(WRS_PATH_FIELD_ID, path));
    }
    if let Some(row) = row {
        child_filters.push(value_filter(WRS_ROW_FIELD_ID, row));
    }

    let mut block = Map::new();
    block.insert(
        "additionalCriteria".to_string(),
        json!({"filterType": "and", "childFilters": child_filters}),
    );
    block
}

fn value_filter(field_id: u32, value: u32) -> Value {
    json!({"filterType": "value", "fieldId": field_id, "value": value})
}

/// `temporalFilter` block from `start` or `start,end`. A single date is used
/// for both ends.
pub fn temporal_criteria(date_spec: &str) -> Result<Map<String, Value>, ApiError> {
    let dates = date_spec.split(',').map(str::trim).collect::<Vec<_>>();
    if dates.iter().any(|d| d.is_empty()) {
        return Err(ApiError::InvalidDateSpec(date_spec.to_string()));
    }
    let (start, end) = match dates.as_slice() {
        [date] => (*date, *date),
        [start, end] => (*start, *end),
        _ => return Err(ApiError::InvalidDateSpec(date_spec.to_string())),
    };

    let mut block = Map::new();
    block.insert(
        "temporalFilter".to_string(),
        json!({"dateField": "search_date", "startDate": start, "endDate": end}),
    );
    Ok(block)
}
