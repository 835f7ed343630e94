mod fingerprint;
mod id_gen;

pub use fingerprint::fingerprint;
pub use id_gen::{event_id_at, event_id_timestamp};
