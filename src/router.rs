//! HTTP request routing and dispatch functionality.
//!
//! This is a deliberately small router: routes are matched by exact `(Method, path)`
//! equality, no dynamic segments, no trailing-slash redirection. The three routes this
//! service exposes (`/webhook/alchemy`, `/webhook/alchemy/events`, `/ping`) are all
//! fixed paths, so exact matching is sufficient and avoids a path-matching engine
//! the service has no use for.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use http::StatusCode;
use hyper::Method;

use crate::{
    body::TakoBody,
    handler::{BoxHandler, Handler},
    middleware::Next,
    responder::Responder,
    route::Route,
    state::set_state,
    types::{BoxMiddleware, Request, Response},
};

/// HTTP router for managing routes, middleware, and request dispatching.
pub struct Router {
    /// Map of registered routes keyed by exact (method, path) pairs.
    routes: DashMap<(Method, String), Arc<Route>>,
    /// Global middleware chain applied to all routes.
    middlewares: RwLock<Vec<BoxMiddleware>>,
}

impl Router {
    /// Creates a new, empty router.
    pub fn new() -> Self {
        Self {
            routes: DashMap::default(),
            middlewares: RwLock::new(Vec::new()),
        }
    }

    /// Registers a new route with the router.
    pub fn route<H, T>(&mut self, method: Method, path: &str, handler: H) -> Arc<Route>
    where
        H: Handler<T> + Clone + 'static,
    {
        let route = Arc::new(Route::new(path.to_string(), method.clone(), BoxHandler::new(handler)));
        self.routes
            .insert((method, path.to_owned()), route.clone());
        route
    }

    /// Dispatches an incoming request to the matching route handler, or 404.
    pub async fn dispatch(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let Some(route) = self.routes.get(&(method, path)).map(|r| r.value().clone()) else {
            return hyper::Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(TakoBody::empty())
                .unwrap();
        };

        let g_mws = self.middlewares.read().unwrap().clone();
        let r_mws = route.middlewares.read().unwrap().clone();
        let mut chain = Vec::with_capacity(g_mws.len() + r_mws.len());
        chain.extend(g_mws);
        chain.extend(r_mws);

        let next = Next {
            middlewares: Arc::new(chain),
            endpoint: Arc::new(route.handler.clone()),
        };
        next.run(req).await
    }

    /// Adds a value to the global state accessible by all handlers.
    pub fn state<T: Clone + Send + Sync + 'static>(&mut self, key: &str, value: T) {
        let _ = key;
        set_state(value);
    }

    /// Adds global middleware to the router.
    ///
    /// Global middleware is executed for all routes in the order it was added,
    /// before any route-specific middleware.
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

        self.middlewares.write().unwrap().push(mw);
        self
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
