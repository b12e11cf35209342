pub mod cache;
pub mod clock;
pub mod refresher;
pub mod snapshot;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{CacheRead, CacheState, ServingCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use refresher::{report_into_store, BrowserRefresher, NavigatorRefresher, Refresher};
pub use snapshot::{JsonFileSnapshotStore, LoadedSnapshot, MemorySnapshotStore, SnapshotStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse snapshot at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no snapshot at {path}")]
    NotFound { path: PathBuf },

    #[error("refusing to use an empty snapshot")]
    EmptySnapshot,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("no fresh data and no fallback snapshot available")]
    NoFallbackAvailable,
}
