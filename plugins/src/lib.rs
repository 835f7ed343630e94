pub mod collaborators;
pub mod factory;
pub mod mappings;
pub mod migrations;
pub mod observers;
pub mod providers;
pub mod validators;
