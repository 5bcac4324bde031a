use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::future::Future;
use std::rc::Rc;

use crate::auth::token::TokenService;
use crate::error::AppError;

/// Paths reachable without a bearer token.
const PUBLIC_PATHS: [&str; 3] = ["/api/health", "/api/auth/login", "/api/auth/register"];

/// Rejects requests without a valid bearer token and stores the decoded
/// `Claims` in the request extensions for `AuthenticatedUser`.
pub struct AuthMiddleware {
    tokens: TokenService,
}

impl AuthMiddleware {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            tokens: Rc::new(self.tokens.clone()),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    tokens: Rc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        // CORS preflights carry no credentials.
        if req.method() == Method::OPTIONS || PUBLIC_PATHS.contains(&req.path()) {
            return forward(self.service.call(req));
        }

        let verified = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| self.tokens.verify(token.trim()));

        match verified {
            Some(Some(claims)) => {
                req.extensions_mut().insert(claims);
                forward(self.service.call(req))
            }
            Some(None) => reject(req, "Invalid or expired token"),
            None => reject(req, "Missing token"),
        }
    }
}

fn forward<F, B>(fut: F) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
where
    F: Future<Output = Result<ServiceResponse<B>, Error>> + 'static,
    B: 'static,
{
    Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
}

/// Answers with a 401 without calling the wrapped service.
fn reject<B>(
    req: ServiceRequest,
    message: &str,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
where
    B: 'static,
{
    let response = AppError::Unauthorized(message.to_string())
        .error_response()
        .map_into_right_body();
    Box::pin(ready(Ok(req.into_response(response))))
}
