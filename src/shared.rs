pub mod emit;
pub mod error;
pub mod events;
pub mod messages;
pub mod settings;
pub mod types;
