mod store;

pub use store::StateEventStore;
