pub mod model;
pub mod v1;
