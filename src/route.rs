//! HTTP route definition and middleware attachment.
//!
//! Routes in this service are fixed literal paths (`/webhook/alchemy`, `/ping`, ...);
//! there is no dynamic segment matching here, so a `Route` is just a method/path pair
//! bound to a handler plus its own middleware chain.

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
};

use http::Method;

use crate::{
    handler::BoxHandler,
    middleware::Next,
    responder::Responder,
    types::{BoxMiddleware, Request},
};

/// A single registered HTTP route.
pub struct Route {
    /// Literal path this route answers to.
    pub path: String,
    /// HTTP method this route responds to.
    pub method: Method,
    /// Handler function to execute when this route is dispatched to.
    pub handler: BoxHandler,
    /// Route-specific middleware chain, run after router-level middleware.
    pub middlewares: RwLock<VecDeque<BoxMiddleware>>,
}

impl Route {
    /// Creates a new route with the specified path, method, and handler.
    pub fn new(path: String, method: Method, handler: BoxHandler) -> Self {
        Self {
            path,
            method,
            handler,
            middlewares: RwLock::new(VecDeque::new()),
        }
    }

    /// Adds middleware to this route's execution chain.
    pub fn middleware<F, Fut, R>(&self, f: F) -> &Self
    where
        F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: std::future::Future<Output = R> + Send + 'static,
        R: Responder + Send + 'static,
    {
        let mw: BoxMiddleware = Arc::new(move |req, next| {
            let fut = f(req, next);
            Box::pin(async move { fut.await.into_response() })
        });

        self.middlewares.write().unwrap().push_back(mw);
        self
    }
}
