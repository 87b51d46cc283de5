use actix_service::forward_ready;
use actix_utils::future::{Ready, ok};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web::Data,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::model::common::AppState;

const ACCESS_TOKEN: &str = "accessToken";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Outcome of token inspection, attached to every request. Handlers use it
/// to decide visibility of permission-gated configs; it never rejects.
#[derive(Clone, Debug, Default)]
pub struct IdentityContext {
    pub identified: bool,
    pub username: String,
}

pub fn decode_jwt_token(
    token: &str,
    secret_key: &str,
) -> jsonwebtoken::errors::Result<TokenData<Claims>> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_base64_secret(secret_key)?,
        &Validation::new(Algorithm::HS256),
    )
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header) = req.headers().get(ACCESS_TOKEN)
        && let Ok(value) = header.to_str()
    {
        return Some(value.trim().to_string());
    }
    if let Some(header) = req.headers().get(actix_web::http::header::AUTHORIZATION)
        && let Ok(value) = header.to_str()
        && let Some(token) = value.strip_prefix(BEARER_PREFIX)
    {
        return Some(token.trim().to_string());
    }
    None
}

pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware { service })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let mut context = IdentityContext::default();

        if Method::OPTIONS != *req.method()
            && let Some(token) = extract_token(&req)
            && let Some(state) = req.app_data::<Data<AppState>>()
            && let Ok(token_data) = decode_jwt_token(&token, &state.auth_secret)
        {
            context.identified = true;
            context.username = token_data.claims.sub;
        }

        req.extensions_mut().insert(context);

        let res = self.service.call(req);

        Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
    }
}
