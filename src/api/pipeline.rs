//! Request pipeline.
//!
//! A call travels through an ordered list of [`Middleware`] and ends in a [`Dispatch`], which
//! performs the actual HTTP round trip. Each middleware receives a [`Next`] handle and may run
//! it zero, one or several times.

use super::Error;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// One API call: operation name plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: String,
    pub payload: Value,
}

impl Request {
    pub fn new(endpoint: impl Into<String>, payload: Value) -> Self {
        Request {
            endpoint: endpoint.into(),
            payload,
        }
    }
}

#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, request: &Request) -> Result<Value, Error>;
}

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: &Request, next: Next<'_>) -> Result<Value, Error>;
}

/// Remainder of the pipeline after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    dispatch: &'a dyn Dispatch,
}

impl<'a> Next<'a> {
    pub async fn run(self, request: &Request) -> Result<Value, Error> {
        match self.middleware.split_first() {
            Some((current, rest)) => {
                let next = Next {
                    middleware: rest,
                    dispatch: self.dispatch,
                };
                current.handle(request, next).await
            }
            None => self.dispatch.dispatch(request).await,
        }
    }
}

pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    dispatch: Arc<dyn Dispatch>,
}

impl Pipeline {
    /// `middleware` is ordered outermost first.
    pub fn new(middleware: Vec<Arc<dyn Middleware>>, dispatch: Arc<dyn Dispatch>) -> Self {
        Pipeline {
            middleware,
            dispatch,
        }
    }

    pub async fn run(&self, request: &Request) -> Result<Value, Error> {
        Next {
            middleware: &self.middleware,
            dispatch: self.dispatch.as_ref(),
        }
        .run(request)
        .await
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Dispatch that replays canned results and records what it was asked.
    pub(crate) struct Scripted {
        results: Mutex<VecDeque<Result<Value, Error>>>,
        pub(crate) seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        pub(crate) fn new(results: Vec<Result<Value, Error>>) -> Self {
            Scripted {
                results: Mutex::new(results.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Dispatch for Scripted {
        async fn dispatch(&self, request: &Request) -> Result<Value, Error> {
            self.seen.lock().unwrap().push(request.endpoint.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Internal("script exhausted".to_string())))
        }
    }

    struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, request: &Request, next: Next<'_>) -> Result<Value, Error> {
            self.1.lock().unwrap().push(self.0);
            next.run(request).await
        }
    }

    #[tokio::test]
    async fn runs_middleware_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let dispatch = Arc::new(Scripted::new(vec![Ok(json!([1, 2]))]));
        let pipeline = Pipeline::new(
            vec![
                Arc::new(Tag("outer", order.clone())),
                Arc::new(Tag("inner", order.clone())),
            ],
            dispatch.clone(),
        );

        let data = pipeline
            .run(&Request::new("getStationList", json!({})))
            .await
            .unwrap();

        assert_eq!(json!([1, 2]), data);
        assert_eq!(vec!["outer", "inner"], *order.lock().unwrap());
        assert_eq!(vec!["getStationList".to_string()], *dispatch.seen.lock().unwrap());
    }

    #[tokio::test]
    async fn empty_pipeline_dispatches_directly() {
        let dispatch = Arc::new(Scripted::new(vec![Ok(json!(null))]));
        let pipeline = Pipeline::new(Vec::new(), dispatch.clone());
        pipeline
            .run(&Request::new("devUpgrade", json!({})))
            .await
            .unwrap();
        assert_eq!(1, dispatch.calls());
    }
}
