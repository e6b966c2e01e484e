//! Domain model (references, identities, resolved URLs, fetch phases).

pub mod bucket_path;
pub mod errors;
pub mod phase;
pub mod reference;
pub mod resolved;

pub use self::bucket_path::BucketPath;
pub use self::errors::{BoxError, CompletionDropped};
pub use self::phase::FetchPhase;
pub use self::reference::{CacheIdentity, Reference, RemoteFile};
pub use self::resolved::ResolvedUrl;
