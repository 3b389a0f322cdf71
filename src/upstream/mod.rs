//! Clients for the achievement and auth upstreams.

pub mod error;
pub mod http;
pub mod psn;
pub mod xbox;

pub use error::{UpstreamError, UpstreamResult};
pub use http::{FetchRequest, FetchResponse, HttpFetch, ReqwestFetch};
pub use psn::PsnClient;
pub use xbox::XboxClient;

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted in-process [`HttpFetch`] used by unit tests.

    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use futures::{FutureExt, future::BoxFuture};

    use super::{FetchRequest, FetchResponse, HttpFetch, UpstreamResult};

    type Responder = dyn Fn(&FetchRequest) -> FetchResponse + Send + Sync;

    pub struct FakeFetch {
        responder: Box<Responder>,
        queued: Mutex<VecDeque<FetchResponse>>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl FakeFetch {
        pub fn new(
            responder: impl Fn(&FetchRequest) -> FetchResponse + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                responder: Box::new(responder),
                queued: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            })
        }

        /// Serve `response` before falling back to the responder.
        pub fn queue(&self, response: FetchResponse) {
            self.queued.lock().unwrap().push_back(response);
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }

        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpFetch for FakeFetch {
        fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, UpstreamResult<FetchResponse>> {
            let response = self
                .queued
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| (self.responder)(&request));
            self.requests.lock().unwrap().push(request);
            async move { Ok(response) }.boxed()
        }
    }
}
