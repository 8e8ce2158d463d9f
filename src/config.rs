use std::env;

pub const FALLBACK_REGION: &str = "us-east-2";
pub const TABLE_NAME: &str = "visitor-counter";
pub const COUNTER_KEY: &str = "homepage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub region: String,
    pub table_name: String,
    pub counter_key: String,
}

impl Config {
    // Only the region comes from the environment; table and key are fixed
    pub fn from_env() -> Self {
        Self {
            region: resolve_region(env::var("AWS_REGION").ok()),
            table_name: TABLE_NAME.to_string(),
            counter_key: COUNTER_KEY.to_string(),
        }
    }
}

// Use the given region, or the fallback when unset or blank
pub fn resolve_region(region: Option<String>) -> String {
    match region {
        Some(r) if !r.trim().is_empty() => r.trim().to_string(),
        _ => FALLBACK_REGION.to_string(),
    }
}
