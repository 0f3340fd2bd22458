//! Callback guard middleware.
//!
//! Daraja does not sign its STK push callbacks, so the callback route is guarded by two optional checks:
//! * a shared secret, carried in the callback URL as `?token=<secret>`. The secret is configured with
//!   `SLM_CALLBACK_SECRET`, and must also appear in `SLM_MPESA_CALLBACK_URL`.
//! * a whitelist of source addresses (`SLM_CALLBACK_IP_WHITELIST`), honouring `X-Forwarded-For` and `Forwarded` if the
//!   server has been told to trust them.
//!
//! A request that fails either check never reaches reconciliation. It is logged, and answered with the same
//! acknowledgement that a genuine callback would get, so that the caller learns nothing.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpResponse,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{
    config::CallbackConfig,
    data_objects::{CallbackAck, CallbackToken},
    helpers::{get_remote_ip, tokens_match},
};

pub struct CallbackGuardFactory {
    config: CallbackConfig,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
}

impl CallbackGuardFactory {
    pub fn new(config: CallbackConfig, use_x_forwarded_for: bool, use_forwarded: bool) -> Self {
        CallbackGuardFactory { config, use_x_forwarded_for, use_forwarded }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CallbackGuardFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = CallbackGuardService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CallbackGuardService {
            config: self.config.clone(),
            use_x_forwarded_for: self.use_x_forwarded_for,
            use_forwarded: self.use_forwarded,
            service: Rc::new(service),
        }))
    }
}

pub struct CallbackGuardService<S> {
    config: CallbackConfig,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
    service: Rc<S>,
}

impl<S> CallbackGuardService<S> {
    fn check(&self, req: &ServiceRequest) -> Result<(), String> {
        let remote_ip = get_remote_ip(req.request(), self.use_x_forwarded_for, self.use_forwarded);
        if let Some(whitelist) = &self.config.whitelist {
            match remote_ip {
                Some(ip) if whitelist.contains(&ip) => trace!("🔐️ Callback source {ip} is whitelisted"),
                Some(ip) => return Err(format!("source address {ip} is not whitelisted")),
                None => return Err("the source address could not be determined".to_string()),
            }
        }
        if let Some(secret) = &self.config.secret {
            let token = web::Query::<CallbackToken>::from_query(req.query_string())
                .ok()
                .and_then(|q| q.into_inner().token)
                .ok_or_else(|| "no callback token was supplied".to_string())?;
            if !tokens_match(secret.reveal(), &token) {
                return Err(format!("invalid callback token from {remote_ip:?}"));
            }
        }
        Ok(())
    }
}

impl<S, B> Service<ServiceRequest> for CallbackGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = self.check(&req);
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match verdict {
                Ok(()) => {
                    trace!("🔐️ Callback request passed verification");
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                },
                Err(reason) => {
                    warn!("🔐️ Ignoring M-PESA callback: {reason}");
                    let res = req.into_response(HttpResponse::Ok().json(CallbackAck::accepted()));
                    Ok(res.map_into_right_body())
                },
            }
        })
    }
}
