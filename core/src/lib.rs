pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod migration;
mod observer;
pub mod state;
pub mod sync;
pub mod util;
