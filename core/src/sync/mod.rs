mod coordinator;
mod mapping;
mod session;

pub use coordinator::StateSyncCoordinator;
pub use mapping::{CompositeMapping, FnMapping, IdentityMapping};
pub use session::{
    sync_session_id, SyncErrorRecord, SyncOptions, SyncReport, SyncSession, SyncSessionSnapshot,
    SyncStrategy,
};
