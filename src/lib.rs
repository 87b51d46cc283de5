//! Multi-tenant configuration and asset distribution service
//!
//! Configs are small typed values (text, color, image reference, structured
//! JSON) addressed by scope plus alias. Assets are uploaded binary files
//! addressed by generated id. The transfer engine moves both between
//! deployments as zip archives and renders static bundles for CDN serving.

pub mod api;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod model;
pub mod service;
pub mod store;
