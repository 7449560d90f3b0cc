//! Handlers: services whose parameter list is a sequence of extractors.

use std::future::Future;
use std::marker::PhantomData;

use crate::extract::FromRequest;
use crate::request::Request;
use crate::response::Response;
use crate::service::{BoxFuture, Service};

/// A handler function taking some number of extractors and returning a
/// response. `Marker` distinguishes the tuple-arity impls below so a
/// single closure type doesn't conflict across arities.
pub trait Handler<Marker>: Clone + Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

/// Adapts any [`Handler`] into a [`Service`], running its extractors in
/// order before invoking the handler; the first extractor that fails
/// short-circuits with its response.
pub struct HandlerService<H, M> {
    handler: H,
    _marker: PhantomData<fn() -> M>,
}

impl<H, M> HandlerService<H, M> {
    pub fn new(handler: H) -> Self {
        HandlerService {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H, M> Service for HandlerService<H, M>
where
    H: Handler<M>,
    M: Send + Sync + 'static,
{
    fn call<'a>(&'a self, req: Request) -> BoxFuture<'a, Response> {
        self.handler.call(req)
    }
}

macro_rules! impl_handler {
    ($($T:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, $($T,)*> Handler<($($T,)*)> for F
        where
            F: Fn($($T,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
            $($T: FromRequest + Send + 'static,)*
        {
            fn call(&self, mut req: Request) -> BoxFuture<'static, Response> {
                let handler = self.clone();
                Box::pin(async move {
                    $(
                        let $T = match $T::from_request(&mut req).await {
                            Ok(v) => v,
                            Err(resp) => return resp,
                        };
                    )*
                    handler($($T,)*).await
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
