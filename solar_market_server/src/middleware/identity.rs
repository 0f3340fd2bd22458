//! Identity middleware.
//!
//! Resolves the caller once per request. The bearer token in the `Authorization` header is verified and its claims
//! are stored in the request extensions, where the [`JwtClaims`] extractor and the ACL middleware pick them up.
//! Requests without a valid token are rejected with a 401 before any handler runs.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{bearer_token, JwtClaims, TokenValidator},
    errors::ServerError,
};

pub struct IdentityMiddlewareFactory {
    validator: TokenValidator,
}

impl IdentityMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        IdentityMiddlewareFactory { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = IdentityMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) }))
    }
}

pub struct IdentityMiddlewareService<S> {
    validator: TokenValidator,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let claims = bearer_token(req.headers()).and_then(|token| self.validator.validate(token));
        Box::pin(async move {
            let claims: JwtClaims = claims.map_err(|e| {
                debug!("🔐️ Rejecting request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            trace!("🔐️ Request to {} by user {} ({})", req.path(), claims.sub, claims.role);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
