use async_trait::async_trait;
use axum::http::{HeaderMap, Method, header::AUTHORIZATION};

use crate::infra::http::routes::Access;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny,
}

/// What a guard gets to see about a request before any handler runs.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    /// Route template the request matched, `None` when nothing matched.
    pub matched_path: Option<String>,
    pub headers: HeaderMap,
    /// Declared access of the matched route.
    pub access: Option<Access>,
}

/// Global authorization check, evaluated once per request ahead of the handler.
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(&self, meta: &RequestMeta) -> GuardDecision;
}

/// Lets public routes through unconditionally and requires the configured API
/// key on everything else.
#[derive(Clone)]
pub struct PublicGuard {
    api_key: Option<String>,
}

impl PublicGuard {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    fn presented_key(headers: &HeaderMap) -> Option<&str> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        Some(value.strip_prefix("Bearer ").unwrap_or(value).trim())
    }
}

#[async_trait]
impl Guard for PublicGuard {
    fn name(&self) -> &'static str {
        "public-guard"
    }

    async fn evaluate(&self, meta: &RequestMeta) -> GuardDecision {
        match meta.access {
            // Unmatched requests fall through to the 404 fallback.
            None | Some(Access::Public) => GuardDecision::Allow,
            Some(Access::Protected) => {
                let Some(expected) = self.api_key.as_deref() else {
                    return GuardDecision::Deny;
                };
                match Self::presented_key(&meta.headers) {
                    Some(presented) if presented == expected => GuardDecision::Allow,
                    _ => GuardDecision::Deny,
                }
            }
        }
    }
}
