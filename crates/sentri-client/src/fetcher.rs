//! The fetch seam used by [`crate::Poller`].
//!
//! Production code polls through [`HttpFetcher`]; tests and simulations
//! plug in their own implementation of the same trait.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use serde::de::DeserializeOwned;

use sentri_protocol::Endpoint;

use crate::{ApiClient, FetchError};

pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Something that can load a `T` for an endpoint.
pub trait Fetcher<T>: Send + Sync + 'static {
    fn fetch<'a>(&'a self, endpoint: &'a Endpoint) -> FetchFuture<'a, T>;
}

/// Fetches and decodes JSON over HTTP.
pub struct HttpFetcher<T> {
    api: ApiClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HttpFetcher<T> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }
}

impl<T> Fetcher<T> for HttpFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn fetch<'a>(&'a self, endpoint: &'a Endpoint) -> FetchFuture<'a, T> {
        Box::pin(self.api.get_json(endpoint))
    }
}
