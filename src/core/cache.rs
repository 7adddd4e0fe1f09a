//! Per-symbol in-memory cache shared across provider instances, so a
//! screening run fetches each ticker at most once.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct SymbolCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<String, V>>>,
}

impl<V> SymbolCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, symbol: &str) -> Option<V> {
        let cache = self.inner.lock().await;
        let value = cache.get(symbol).cloned();
        if value.is_some() {
            debug!(%symbol, "Cache HIT");
        } else {
            debug!(%symbol, "Cache MISS");
        }
        value
    }

    pub async fn put(&self, symbol: &str, value: V) {
        let mut cache = self.inner.lock().await;
        debug!(%symbol, "Cache PUT");
        cache.insert(symbol.to_string(), value);
    }
}

impl<V> Default for SymbolCache<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
