use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

mod config;
mod error;
mod handler;
mod store;

use config::Config;
use handler::function_handler;
use store::DynamoCounterStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // CloudWatch adds the ingestion time and the module name is noise
        .with_target(false)
        .without_time()
        .init();

    // Build the store client at cold start (once per container lifecycle)
    let config = Config::from_env();
    let aws = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;
    let store = DynamoCounterStore::new(aws_sdk_dynamodb::Client::new(&aws), &config.table_name);
    tracing::info!(region = %config.region, table = %config.table_name, "visitor counter ready");

    let store = &store;
    let key = config.counter_key.as_str();
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(store, key, event).await
    }))
    .await
}
