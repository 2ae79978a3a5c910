//! Bearer-token authentication for the TapToSell server.
//!
//! Clients authenticate with an `Authorization: Bearer <token>` header. The middleware resolves
//! the token against the access-token store and places the resulting [`UserClaims`] in the request
//! extensions, where the [`crate::middleware::AclMiddlewareFactory`] and the handlers pick them
//! up. Tokens are opaque; revoking one is a database delete.
use std::{
    future::{ready, Ready},
    pin::Pin,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use futures::Future;
use log::*;
use taptosell_engine::{db_types::UserClaims, traits::AuthManagement};

use crate::errors::{AuthError, ServerError};

/// Extractor for the authenticated user's claims. Only available on routes behind the token
/// middleware.
#[derive(Debug, Clone)]
pub struct Claims(pub UserClaims);

impl FromRequest for Claims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<UserClaims>().cloned();
        ready(claims.map(Claims).ok_or_else(|| {
            warn!("💻️ No user claims found in request extensions. Is the route behind the token middleware?");
            ServerError::AuthenticationError(AuthError::MissingToken)
        }))
    }
}

pub struct TokenAuthMiddlewareFactory<B> {
    db: B,
}

impl<B: AuthManagement> TokenAuthMiddlewareFactory<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<S, B, D> Transform<S, ServiceRequest> for TokenAuthMiddlewareFactory<D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = TokenAuthMiddlewareService<S, D>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddlewareService { db: self.db.clone(), service: Rc::new(service) }))
    }
}

pub struct TokenAuthMiddlewareService<S, D> {
    db: D,
    service: Rc<S>,
}

impl<S, B, D> Service<ServiceRequest> for TokenAuthMiddlewareService<S, D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let db = self.db.clone();
        Box::pin(async move {
            let token = bearer_token(&req).ok_or_else(|| {
                debug!("💻️ Request to {} carried no bearer token", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            let claims = db
                .claims_for_token(&token)
                .await
                .map_err(ServerError::from)?
                .ok_or_else(|| {
                    debug!("💻️ Unrecognised bearer token on request to {}", req.path());
                    ServerError::AuthenticationError(AuthError::InvalidToken)
                })?;
            trace!("🔑️ Request authenticated for user #{}", claims.user_id);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}
