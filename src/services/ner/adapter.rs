//! Lazily constructed NER backend shared by a filter's worker tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{keys, Configuration};

use super::corenlp::{CoreNlpBackend, DEFAULT_SERVER_URL};
use super::{NerBackend, NerError, NerResult, RegexNerBackend};

type BackendFactory = Arc<dyn Fn() -> Result<Arc<dyn NerBackend>, NerError> + Send + Sync>;

/// Holds a backend factory and constructs the backend on first use.
///
/// Concurrent first calls wait on the same initialisation, so at most one
/// backend is built per adapter. A failed construction is not cached; the
/// next call tries again.
pub struct NerAdapter {
    factory: BackendFactory,
    backend: OnceCell<Arc<dyn NerBackend>>,
}

impl NerAdapter {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn NerBackend>, NerError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            backend: OnceCell::new(),
        }
    }

    /// Adapter around an already constructed backend.
    pub fn with_backend(backend: Arc<dyn NerBackend>) -> Self {
        let factory_backend = backend.clone();
        Self {
            factory: Arc::new(move || Ok(factory_backend.clone())),
            backend: OnceCell::new_with(Some(backend)),
        }
    }

    /// Choose the backend from `ner.backend` and its settings.
    pub fn from_conf(conf: &Configuration) -> Self {
        let backend = conf.get_or(keys::NER_BACKEND, "regex");
        match backend.as_str() {
            "regex" => Self::new(|| Ok(Arc::new(RegexNerBackend::new()) as Arc<dyn NerBackend>)),
            "corenlp" => {
                let url = conf.get_or(keys::NER_CORENLP_URL, DEFAULT_SERVER_URL);
                let timeout =
                    Duration::from_secs(conf.get_u64(keys::NER_CORENLP_TIMEOUT_SECS, 60));
                Self::new(move || {
                    CoreNlpBackend::new(&url, timeout).map(|b| Arc::new(b) as Arc<dyn NerBackend>)
                })
            }
            other => {
                let other = other.to_string();
                Self::new(move || Err(NerError::Init(format!("unknown NER backend '{}'", other))))
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.initialized()
    }

    async fn backend(&self) -> Result<&Arc<dyn NerBackend>, NerError> {
        self.backend
            .get_or_try_init(|| async {
                let backend = (self.factory)()?;
                info!("Initialized NER backend: {}", backend.backend_id());
                Ok(backend)
            })
            .await
    }

    /// Recognise entities, constructing the backend first if needed.
    pub async fn recognise(&self, text: &str) -> Result<NerResult, NerError> {
        self.backend().await?.recognise(text).await
    }
}

impl Default for NerAdapter {
    fn default() -> Self {
        Self::from_conf(&Configuration::default())
    }
}
