use std::collections::HashMap;

use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::{json, Value};

use crate::store::CounterStore;

const CORS_HEADER: &str = "Access-Control-Allow-Origin";

/// Result of a single counter update, before it is encoded for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterOutcome {
    Success { visits: u64 },
    Failure { message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    pub body: String,
}

impl From<CounterOutcome> for CounterResponse {
    fn from(outcome: CounterOutcome) -> Self {
        match outcome {
            CounterOutcome::Success { visits } => CounterResponse {
                status_code: 200,
                headers: Some(HashMap::from([(CORS_HEADER.to_string(), "*".to_string())])),
                body: json!({ "visits": visits }).to_string(),
            },
            // Failure responses carry no CORS header
            CounterOutcome::Failure { message } => CounterResponse {
                status_code: 500,
                headers: None,
                body: json!({ "error": message }).to_string(),
            },
        }
    }
}

// One atomic increment against the store; no retries
pub async fn increment_visits<S: CounterStore + ?Sized>(store: &S, key: &str) -> CounterOutcome {
    match store.increment(key).await {
        Ok(visits) => {
            tracing::info!(key, visits, "counter incremented");
            CounterOutcome::Success { visits }
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(key, error = %message, "counter update failed");
            CounterOutcome::Failure { message }
        }
    }
}

// Main Lambda handler - the event payload and context are not inspected
pub async fn function_handler<S: CounterStore + ?Sized>(
    store: &S,
    key: &str,
    _event: LambdaEvent<Value>,
) -> Result<CounterResponse, Error> {
    Ok(increment_visits(store, key).await.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lambda_runtime::Context;

    use super::*;
    use crate::store::memory::{MemoryCounterStore, Outage};

    const KEY: &str = "homepage";

    fn empty_event() -> LambdaEvent<Value> {
        LambdaEvent::new(json!({}), Context::default())
    }

    async fn invoke(store: &MemoryCounterStore) -> CounterResponse {
        function_handler(store, KEY, empty_event()).await.unwrap()
    }

    fn body(response: &CounterResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn success_returns_visits_with_cors() {
        let store = MemoryCounterStore::new();
        let response = invoke(&store).await;

        assert_eq!(response.status_code, 200);
        let headers = response.headers.as_ref().unwrap();
        assert_eq!(headers.get(CORS_HEADER).map(String::as_str), Some("*"));
        assert_eq!(body(&response), json!({ "visits": 1 }));
    }

    #[tokio::test]
    async fn sequential_invocations_increase_by_one() {
        let store = MemoryCounterStore::new();
        let first = body(&invoke(&store).await)["visits"].as_u64().unwrap();
        let second = body(&invoke(&store).await)["visits"].as_u64().unwrap();
        assert_eq!(second, first + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_invocations_lose_no_updates() {
        let store = Arc::new(MemoryCounterStore::new());
        let n = 64;

        let tasks: Vec<_> = (0..n)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { invoke(&store).await.status_code })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), 200);
        }

        assert_eq!(store.get(KEY), Some(n));
    }

    #[tokio::test]
    async fn failure_returns_error_without_cors() {
        let store = MemoryCounterStore::new();
        store.fail_next(Outage::BeforeWrite);
        let response = invoke(&store).await;

        assert_eq!(response.status_code, 500);
        assert!(response.headers.is_none());
        let error = body(&response)["error"].as_str().unwrap().to_string();
        assert!(!error.is_empty());
    }

    #[test]
    fn serialized_response_uses_lambda_field_names() {
        let ok = serde_json::to_value(CounterResponse::from(CounterOutcome::Success { visits: 5 }))
            .unwrap();
        assert_eq!(ok["statusCode"], 200);
        assert_eq!(ok["headers"][CORS_HEADER], "*");
        assert_eq!(ok["body"], r#"{"visits":5}"#);

        let failed = serde_json::to_value(CounterResponse::from(CounterOutcome::Failure {
            message: "boom".into(),
        }))
        .unwrap();
        assert_eq!(failed["statusCode"], 500);
        assert!(failed.get("headers").is_none());
        assert_eq!(failed["body"], r#"{"error":"boom"}"#);
    }

    #[tokio::test]
    async fn outage_before_write_does_not_mutate() {
        let store = MemoryCounterStore::new();
        assert_eq!(body(&invoke(&store).await), json!({ "visits": 1 }));
        assert_eq!(body(&invoke(&store).await), json!({ "visits": 2 }));

        store.fail_next(Outage::BeforeWrite);
        assert_eq!(invoke(&store).await.status_code, 500);

        assert_eq!(body(&invoke(&store).await), json!({ "visits": 3 }));
    }

    #[tokio::test]
    async fn outage_after_write_still_counts_the_visit() {
        let store = MemoryCounterStore::new();
        invoke(&store).await;
        invoke(&store).await;

        store.fail_next(Outage::AfterWrite);
        let failed = invoke(&store).await;
        assert_eq!(failed.status_code, 500);
        assert!(body(&failed)["error"].is_string());

        assert_eq!(body(&invoke(&store).await), json!({ "visits": 4 }));
    }
}
