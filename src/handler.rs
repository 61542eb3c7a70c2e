//! Handler trait and type erasure.
//!
//! The router stores handlers of *different* concrete types in one map, so
//! each is hidden behind a trait object. A handler is any
//!
//! ```text
//! async fn name(req: Request, ctx: Arc<AppContext>) -> impl IntoResponse
//! ```
//!
//! The second argument is the injected application context — the shared
//! storage handle constructed once at bootstrap. Passing it explicitly
//! (rather than reaching for a global) is what makes the pipeline testable
//! against an in-memory store.
//!
//! Runtime cost per request: one `Arc` clone plus one virtual call —
//! negligible next to network I/O.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::storage::AppContext;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, ctx: Arc<AppContext>) -> BoxFuture;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself — it is automatically satisfied for
/// any `async fn(Request, Arc<AppContext>) -> impl IntoResponse`. The trait
/// is sealed so the blanket impl below is the only way in.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Arc<AppContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Arc<AppContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype wrapper bridging a concrete handler `F` to the trait-object
/// world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Arc<AppContext>) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, ctx: Arc<AppContext>) -> BoxFuture {
        let fut = (self.0)(req, ctx);
        Box::pin(async move { fut.await.into_response() })
    }
}
