use serde_json::{Value, json};

/// Global response-shaping step applied to successful JSON handler results.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, value: Value) -> Value;
}

/// Wraps every successful result as `{"data": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapResponseInterceptor;

impl Interceptor for WrapResponseInterceptor {
    fn name(&self) -> &'static str {
        "wrap-response"
    }

    fn transform(&self, value: Value) -> Value {
        json!({ "data": value })
    }
}
