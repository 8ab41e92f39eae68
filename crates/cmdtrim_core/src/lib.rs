pub mod artifact;
pub mod catalog;
pub mod config;
pub mod extract;
pub mod header;
pub mod inventory;
pub mod layout;
pub mod release;
pub mod runtime;
