mod load;
mod types;

pub use load::{get_unistate_data_dir, load_default, load_from_path};
pub use types::{
    EventStoreConfig, LoggingConfig, ObserverConfig, ReplicationConfig, StateConfig, SyncConfig,
    ValidationConfig,
};
