//! Config CRUD handlers
//!
//! - GET    /api/v1/resource/configs          - paged search
//! - GET    /api/v1/resource/configs/{key}    - detail
//! - POST   /api/v1/resource/configs          - create
//! - PUT    /api/v1/resource/configs/{key}    - update
//! - DELETE /api/v1/resource/configs/{key}    - delete

use actix_web::{HttpMessage, HttpRequest, Scope as ActixScope, delete, get, post, put, web};

use crate::api::model::{ConfigForm, ConfigSearchParam, ScopeParam};
use crate::error::AppError;
use crate::middleware::auth::IdentityContext;
use crate::model::common::{AppState, RestResult};
use crate::service;

fn identified(req: &HttpRequest) -> bool {
    req.extensions()
        .get::<IdentityContext>()
        .is_some_and(|c| c.identified)
}

async fn search_inner(
    req: &HttpRequest,
    data: &web::Data<AppState>,
    params: &ConfigSearchParam,
) -> Result<actix_web::HttpResponse, AppError> {
    let page = service::config::search_page(
        &*data.configs,
        &params.to_scope(),
        &params.alias,
        &params.name,
        identified(req),
        params.page_no,
        params.page_size,
    )
    .await?;
    Ok(RestResult::<String>::http_success(page))
}

#[get("")]
pub async fn search(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ConfigSearchParam>,
) -> Result<actix_web::HttpResponse, AppError> {
    search_inner(&req, &data, &params).await
}

#[get("/page")]
pub async fn search_page(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ConfigSearchParam>,
) -> Result<actix_web::HttpResponse, AppError> {
    search_inner(&req, &data, &params).await
}

#[get("/{resource_key}")]
pub async fn detail(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<ScopeParam>,
) -> Result<actix_web::HttpResponse, AppError> {
    let info = service::config::detail(
        &*data.configs,
        &params.to_scope(),
        &path.into_inner(),
        identified(&req),
    )
    .await?;
    Ok(RestResult::<String>::http_success(info))
}

#[post("")]
pub async fn create(
    data: web::Data<AppState>,
    form: web::Json<ConfigForm>,
) -> Result<actix_web::HttpResponse, AppError> {
    let info =
        service::config::add(&*data.configs, &*data.assets, form.into_inner().into_info()).await?;
    Ok(RestResult::<String>::http_success(info))
}

#[put("/{resource_key}")]
pub async fn update(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<ConfigForm>,
) -> Result<actix_web::HttpResponse, AppError> {
    let mut info = form.into_inner().into_info();
    info.resource_key = path.into_inner();
    let info = service::config::update(&*data.configs, &*data.assets, info).await?;
    Ok(RestResult::<String>::http_success(info))
}

#[delete("/{resource_key}")]
pub async fn remove(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<ScopeParam>,
) -> Result<actix_web::HttpResponse, AppError> {
    service::config::delete(&*data.configs, &params.to_scope(), &path.into_inner()).await?;
    Ok(RestResult::<String>::http_success(true))
}

pub fn routes() -> ActixScope {
    web::scope("/configs")
        .service(search)
        .service(search_page)
        .service(create)
        .service(detail)
        .service(update)
        .service(remove)
}
