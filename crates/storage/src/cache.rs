use thiserror::Error;

use crate::digest::sha256_hex;
use crate::store::{FileStore, StoreError, WritableStore};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No file starting with '{prefix}' in the cache or at {remote}")]
    NotFound { prefix: String, remote: String },
    #[error("Retrieval from {remote} failed: {source}")]
    Retrieval {
        remote: String,
        #[source]
        source: StoreError,
    },
    #[error("Cache error: {0}")]
    Cache(#[source] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Remote,
}

#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub origin: Origin,
    /// SHA-256 of `bytes`, lowercase hex.
    pub sha256: String,
}

/// First name (in lexicographic order) starting with `prefix`.
pub fn first_match(mut names: Vec<String>, prefix: &str) -> Option<String> {
    names.sort();
    names.into_iter().find(|n| n.starts_with(prefix))
}

/// Resolves reference files by name prefix, serving from a local cache and
/// filling it from a remote on a miss. Cached entries are returned as-is.
pub struct ReferenceCache<C, R> {
    cache: C,
    remote: R,
}

impl<C: WritableStore, R: FileStore> ReferenceCache<C, R> {
    pub fn new(cache: C, remote: R) -> Self {
        Self { cache, remote }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn resolve(&self, prefix: &str) -> Result<ResolvedFile, ResolveError> {
        let cached = self.cache.list().map_err(ResolveError::Cache)?;
        if let Some(name) = first_match(cached, prefix) {
            tracing::info!("Found {name} in cache {}", self.cache.location());
            let bytes = self.cache.fetch(&name).map_err(ResolveError::Cache)?;
            return Ok(resolved(name, bytes, Origin::Cache));
        }

        let remote = self.remote.location();
        tracing::info!("{prefix}* not cached; looking at {remote}");
        let listed = self.remote.list().map_err(|source| ResolveError::Retrieval {
            remote: remote.clone(),
            source,
        })?;
        let Some(name) = first_match(listed, prefix) else {
            return Err(ResolveError::NotFound {
                prefix: prefix.to_string(),
                remote,
            });
        };

        tracing::info!("Fetching {name} from {remote}");
        let bytes = self
            .remote
            .fetch(&name)
            .map_err(|source| ResolveError::Retrieval { remote, source })?;
        self.cache
            .store(&name, &bytes)
            .map_err(ResolveError::Cache)?;
        tracing::info!("Cached {name} ({} bytes)", bytes.len());

        Ok(resolved(name, bytes, Origin::Remote))
    }
}

fn resolved(name: String, bytes: Vec<u8>, origin: Origin) -> ResolvedFile {
    let sha256 = sha256_hex(&bytes);
    tracing::debug!("{name}: sha256={sha256}");
    ResolvedFile {
        name,
        bytes,
        origin,
        sha256,
    }
}
