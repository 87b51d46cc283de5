pub mod archive;
pub mod asset;
pub mod config;
pub mod content;
pub mod lock;
pub mod reference;
pub mod static_bundle;
pub mod transfer;
