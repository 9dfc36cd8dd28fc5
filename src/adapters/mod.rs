//! Source adapter boundary.
//!
//! An adapter fetches one domain's data for a request and returns a
//! [`SourceSummary`]. Adapters are external collaborators; the two shipped
//! here are plain I/O wrappers (canned fixtures and a generic HTTP JSON
//! endpoint). Retry, if any, belongs inside an adapter.

pub mod fixture;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{AdapterError, RegistryError};
use crate::request::AggregationRequest;
use crate::source::{normalize_id, Source, SourceRegistry};
use crate::summary::SourceSummary;

pub use fixture::FixtureAdapter;
pub use self::http::HttpJsonAdapter;

/// What an adapter sees for one invocation.
pub struct InvocationContext<'a> {
    pub request: &'a AggregationRequest,
    /// Cancelled when the caller abandons the request. Long-running adapters
    /// may poll it; the coordinator also drops the invocation future.
    pub cancel: &'a CancellationToken,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn invoke(&self, ctx: &InvocationContext<'_>) -> Result<SourceSummary, AdapterError>;

    /// Adapter name for diagnostics.
    fn name(&self) -> &str;
}

pub type SharedAdapter = Arc<dyn SourceAdapter>;

/// A source paired with the adapter that serves it.
#[derive(Clone)]
pub struct BoundAdapter {
    pub source: Source,
    pub adapter: SharedAdapter,
}

impl std::fmt::Debug for BoundAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundAdapter")
            .field("source", &self.source.id)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Pair every registered source with its adapter, in registry order.
///
/// Every source needs exactly one adapter. Adapters keyed by an unknown id are
/// ignored (logged), later duplicates replace earlier ones.
pub fn bind<I, S>(registry: &SourceRegistry, adapters: I) -> Result<Vec<BoundAdapter>, RegistryError>
where
    I: IntoIterator<Item = (S, SharedAdapter)>,
    S: AsRef<str>,
{
    let mut by_id: Vec<(String, SharedAdapter)> = Vec::new();
    for (id, adapter) in adapters {
        let id = normalize_id(id.as_ref());
        if registry.get(&id).is_none() {
            tracing::warn!(target: "fanout", source = %id, "adapter for unknown source ignored");
            continue;
        }
        by_id.retain(|(k, _)| k != &id);
        by_id.push((id, adapter));
    }

    registry
        .iter()
        .map(|source| {
            by_id
                .iter()
                .find(|(id, _)| id == &source.id)
                .map(|(_, adapter)| BoundAdapter {
                    source: source.clone(),
                    adapter: Arc::clone(adapter),
                })
                .ok_or_else(|| RegistryError::MissingAdapter(source.id.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFamily;
    use crate::summary::NewsSummary;

    fn news() -> SharedAdapter {
        Arc::new(FixtureAdapter::from_summary(
            "news-fixture",
            SourceSummary::News(NewsSummary::default()),
        ))
    }

    #[test]
    fn binds_in_registry_order() {
        let registry = SourceRegistry::new(vec![
            Source::new("news", SourceFamily::News, 0.5),
            Source::new("events", SourceFamily::Events, 0.5),
        ])
        .unwrap();
        let bound = bind(&registry, vec![("events", news()), ("NEWS", news())]).unwrap();
        let ids: Vec<_> = bound.iter().map(|b| b.source.id.as_str()).collect();
        assert_eq!(ids, vec!["news", "events"]);
    }

    #[test]
    fn missing_adapter_is_an_error() {
        let registry = SourceRegistry::new(vec![
            Source::new("news", SourceFamily::News, 0.5),
            Source::new("events", SourceFamily::Events, 0.5),
        ])
        .unwrap();
        let err = bind(&registry, vec![("news", news()), ("radio", news())]).unwrap_err();
        assert_eq!(err, RegistryError::MissingAdapter("events".into()));
    }
}
