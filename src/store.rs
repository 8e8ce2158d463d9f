use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;

use crate::error::StoreError;

const KEY_ATTRIBUTE: &str = "id";
const VISITS_ATTRIBUTE: &str = "visits";
const INCREMENT_EXPRESSION: &str = "SET visits = if_not_exists(visits, :start) + :inc";

/// Durable counter storage. `increment` must be atomic under concurrent
/// callers and return the value after the increment.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;
}

/// Counter store backed by a DynamoDB table. Built once per execution
/// environment and shared by reference across invocations.
pub struct DynamoCounterStore {
    client: Client,
    table_name: String,
}

impl DynamoCounterStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl CounterStore for DynamoCounterStore {
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .update_expression(INCREMENT_EXPRESSION)
            .expression_attribute_values(":start", AttributeValue::N("0".to_string()))
            .expression_attribute_values(":inc", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| StoreError::Request(DisplayErrorContext(&e).to_string()))?;

        let visits = output
            .attributes()
            .and_then(|attrs| attrs.get(VISITS_ATTRIBUTE))
            .ok_or(StoreError::MissingAttribute(VISITS_ATTRIBUTE))?;
        parse_visits(visits)
    }
}

/// Converts the store's counter attribute to a plain integer.
///
/// DynamoDB numbers arrive as arbitrary-precision decimal strings. Integral
/// values in any notation (`"3"`, `"3.0"`, `"3E0"`) are converted exactly.
/// Fractional, negative and out-of-range values are rejected with
/// [`StoreError::InvalidNumber`], never truncated or clamped.
pub fn parse_visits(value: &AttributeValue) -> Result<u64, StoreError> {
    let raw = value
        .as_n()
        .map_err(|other| StoreError::InvalidNumber(format!("{other:?}")))?;

    parse_integral_decimal(raw.trim()).ok_or_else(|| StoreError::InvalidNumber(raw.clone()))
}

fn parse_integral_decimal(raw: &str) -> Option<u64> {
    let (mantissa, exponent) = match raw.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&raw[..i], raw[i + 1..].parse::<i64>().ok()?),
        None => (raw, 0),
    };
    let mantissa = mantissa.strip_prefix('+').unwrap_or(mantissa);
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }

    // Value is digits * 10^scale
    let scale = exponent.checked_sub(fraction.len() as i64)?;
    if scale >= 0 {
        // u64::MAX has 20 digits
        if digits.len() as i64 + scale > 20 {
            return None;
        }
        format!("{digits}{}", "0".repeat(scale as usize)).parse().ok()
    } else {
        let keep = (digits.len() as i64 + scale).max(0) as usize;
        let (integral, dropped) = digits.split_at(keep);
        if dropped.bytes().any(|b| b != b'0') {
            return None;
        }
        integral.parse().ok()
    }
}
