pub mod asset;
pub mod config;
pub mod transfer;

use actix_web::{Scope as ActixScope, web};

pub fn routes() -> ActixScope {
    web::scope("/api/v1/resource")
        .service(config::routes())
        .service(asset::routes())
        .service(transfer::routes())
}
