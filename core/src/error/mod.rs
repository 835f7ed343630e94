#[allow(clippy::module_inception)]
pub mod error;
pub mod validation;

pub use error::{StateError, StateResult};
pub use validation::ValidationError;
