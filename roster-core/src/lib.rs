//! Roster library exports

pub mod asset;
pub mod catalog;
pub mod config;
pub mod resolve;
pub mod validate;
pub mod version;
