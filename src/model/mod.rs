pub mod asset;
pub mod common;
pub mod config;
pub mod transfer;
