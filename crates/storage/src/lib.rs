pub mod cache;
pub mod digest;
pub mod http;
pub mod remote;
pub mod store;

pub use cache::{first_match, Origin, ReferenceCache, ResolveError, ResolvedFile};
pub use digest::{sha256_bytes, sha256_hex, to_hex};
pub use http::HttpDirectoryStore;
pub use remote::Remote;
pub use store::{DirectoryStore, FileStore, MemoryStore, Offline, StoreError, WritableStore};
