pub mod asset_file;
pub mod resource_config;
pub mod write_lock;
