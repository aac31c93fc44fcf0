pub mod api;
pub mod cli;
pub mod directory;
pub mod error;
pub mod membership;
pub mod node;
pub mod protocol;
pub mod settings;
pub mod transport;
