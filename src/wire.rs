//! Shapes exchanged with the remote record store.
//!
//! Resources travel inside a `{ "data": ..., "meta": {} }` envelope with the
//! fields nested under `attributes`; the domain types are flat.

use crate::errors::GatewayError;
use crate::models::{CounterDetails, NewCounter, RemoteCounter, RemoteId, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCounter {
    pub id: u64,
    pub attributes: ApiAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ApiCounter> for RemoteCounter {
    type Error = GatewayError;

    fn try_from(api: ApiCounter) -> Result<Self, Self::Error> {
        let attrs = api.attributes;
        let name = attrs
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| GatewayError::Decode(format!("counter {} has no name", api.id)))?;
        // null, missing and zero all mean "no bound"
        let max = attrs
            .max
            .and_then(|max| u64::try_from(max).ok())
            .filter(|max| *max >= 1);
        let count = u64::try_from(attrs.amount).unwrap_or(0);
        let count = max.map_or(count, |max| count.min(max));
        let category = attrs.category.filter(|category| !category.trim().is_empty());

        Ok(RemoteCounter {
            id: RemoteId(api.id),
            name,
            count,
            max,
            category,
            updated_at: attrs.updated_at,
        })
    }
}

/// Decodes list items one by one; a malformed record is logged and skipped.
pub(crate) fn decode_counters(items: Vec<Value>) -> Vec<RemoteCounter> {
    items
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value::<ApiCounter>(item)
                .map_err(|err| GatewayError::Decode(err.to_string()))
                .and_then(RemoteCounter::try_from)
                .map_err(|err| warn!("skipping counter record: {err}"))
                .ok()
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub(crate) struct DataBody<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFields<'a> {
    pub name: &'a str,
    pub amount: u64,
    pub max: Option<u64>,
    pub category: Option<&'a str>,
}

impl<'a> From<&'a NewCounter> for CreateFields<'a> {
    fn from(counter: &'a NewCounter) -> Self {
        Self {
            name: &counter.name,
            amount: 0,
            max: counter.max,
            category: counter.category.as_deref(),
        }
    }
}

/// Partial update of name/max/category. `amount` is only sent when a lowered bound clamped it.
#[derive(Debug, Serialize)]
pub(crate) struct DetailFields<'a> {
    pub name: &'a str,
    pub max: Option<u64>,
    pub category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
}

impl<'a> DetailFields<'a> {
    pub fn new(details: &'a CounterDetails, clamped_amount: Option<u64>) -> Self {
        Self {
            name: &details.name,
            max: details.max,
            category: details.category.as_deref(),
            amount: clamped_amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AmountField {
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub jwt: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}

/// Pulls `error.message` out of a failure body, if there is one.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
}
