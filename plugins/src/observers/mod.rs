mod broadcast;
mod logging;

pub use broadcast::BroadcastObserver;
pub use logging::TracingObserver;
