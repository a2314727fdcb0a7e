use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("sequence namespace must not be empty")]
    InvalidNamespace,
    #[error("sequence `{namespace}` is exhausted")]
    Overflow { namespace: String },
    /// The store could not persist the increment. No value was handed out.
    #[error("failed to advance sequence `{namespace}`: {source}")]
    WriteFailure {
        namespace: String,
        #[source]
        source: BoxError,
    },
}

/// SequenceStore
///
/// Storage seam for named counters. Implementations must make
/// `next_value` an atomic increment-and-fetch: a missing namespace starts at 0,
/// so its first call returns 1, and concurrent callers on one namespace never
/// observe the same value.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn next_value(&self, namespace: &str) -> Result<i64, SequenceError>;
}

pub type SequenceStoreState = Arc<dyn SequenceStore>;

/// SequenceGenerator
///
/// Mints identifiers for resource types ("user", "recipe", ...). Thin wrapper
/// over a [`SequenceStore`] that validates the namespace and logs failures.
#[derive(Clone)]
pub struct SequenceGenerator {
    store: SequenceStoreState,
}

impl SequenceGenerator {
    pub fn new(store: SequenceStoreState) -> Self {
        Self { store }
    }

    /// A generator over a fresh [`InMemorySequenceStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySequenceStore::default()))
    }

    /// get_next
    ///
    /// Returns the next value for `namespace`. Errors must abort whatever the
    /// caller was creating.
    pub async fn get_next(&self, namespace: &str) -> Result<i64, SequenceError> {
        if namespace.trim().is_empty() {
            return Err(SequenceError::InvalidNamespace);
        }

        match self.store.next_value(namespace).await {
            Ok(value) => {
                tracing::debug!(namespace, value, "sequence advanced");
                Ok(value)
            }
            Err(e) => {
                tracing::error!(namespace, error = %e, "sequence advance failed");
                Err(e)
            }
        }
    }
}

/// InMemorySequenceStore
///
/// Process-local counters, one mutex per namespace. The outer map lock is only
/// held long enough to find or create a namespace's counter, so increments on
/// different namespaces do not contend.
#[derive(Default)]
pub struct InMemorySequenceStore {
    counters: RwLock<HashMap<String, Arc<Mutex<i64>>>>,
}

impl InMemorySequenceStore {
    fn counter(&self, namespace: &str) -> Arc<Mutex<i64>> {
        if let Some(counter) = self.counters.read().get(namespace) {
            return Arc::clone(counter);
        }

        // Re-check under the write lock: another caller may have created it.
        Arc::clone(
            self.counters
                .write()
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(0))),
        )
    }

    /// Current value without advancing; `None` if the namespace was never used.
    pub fn current(&self, namespace: &str) -> Option<i64> {
        self.counters
            .read()
            .get(namespace)
            .map(|counter| *counter.lock())
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn next_value(&self, namespace: &str) -> Result<i64, SequenceError> {
        let counter = self.counter(namespace);
        let mut value = counter.lock();
        let next = value.checked_add(1).ok_or_else(|| SequenceError::Overflow {
            namespace: namespace.to_string(),
        })?;
        *value = next;
        Ok(next)
    }
}
