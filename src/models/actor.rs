use actix_service::{self, Transform};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    http::header::HeaderName,
    Error, HttpMessage, HttpRequest,
};
use futures::{
    future::{ready, LocalBoxFuture, Ready},
    FutureExt,
};
use std::rc::Rc;

use crate::error::ValidationError;

/// Attributed to records when nobody can be identified.
pub const SYSTEM_ACTOR: &str = "システム";

pub const ACTOR_MAX_LENGTH: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor(pub String);

pub struct ActorMiddleware<S> {
    service: Rc<S>,
    header: HeaderName,
}
pub struct ActorMiddlewareFactory {
    header: HeaderName,
}

impl Actor {
    /// The actor attached by `ActorMiddleware`, or the system sentinel.
    pub fn resolve(req: &HttpRequest) -> String {
        req.extensions()
            .get::<Actor>()
            .map(|actor| actor.0.clone())
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string())
    }
    /// Audit columns hold at most `ACTOR_MAX_LENGTH` characters; longer names
    /// are refused rather than cut.
    pub fn check(actor: &str) -> Result<(), ValidationError> {
        if actor.chars().count() > ACTOR_MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "actor",
                max: ACTOR_MAX_LENGTH,
            });
        }
        Ok(())
    }
}

impl ActorMiddlewareFactory {
    pub fn new(header: HeaderName) -> Self {
        ActorMiddlewareFactory { header }
    }
}

impl<S, B> Service<ServiceRequest> for ActorMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv: Rc<S> = self.service.clone();

        let actor = req
            .headers()
            .get(&self.header)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if let Some(name) = actor {
            req.extensions_mut().insert::<Actor>(Actor(name));
        }

        async move {
            let res: ServiceResponse<B> = srv.call(req).await?;
            Ok(res)
        }
        .boxed_local()
    }
}
impl<S, B> Transform<S, ServiceRequest> for ActorMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ActorMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ActorMiddleware {
            service: Rc::new(service),
            header: self.header.clone(),
        }))
    }
}
