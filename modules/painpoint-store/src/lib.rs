pub mod error;
pub mod memory;
pub mod pg;
pub mod store;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use error::{Result, StoreError};
pub use memory::MemoryAnalysisStore;
pub use pg::PgAnalysisStore;
pub use store::{clamp_limit, AnalysisStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
