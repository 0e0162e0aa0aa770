use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CoreError;

use super::{classify_response, Fetcher, RATE_LIMIT_SENTINEL};

/// A canned upstream reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Body(String),
    Status(u16),
}

impl MockReply {
    pub fn body(body: impl Into<String>) -> Self {
        Self::Body(body.into())
    }

    pub fn rate_limited() -> Self {
        Self::Body(RATE_LIMIT_SENTINEL.to_owned())
    }
}

/// A mock fetcher for testing. Replies are queued per URL and consumed in
/// order; the last reply for a URL repeats forever. Unknown URLs get a 404.
/// Every requested URL is logged.
pub struct MockFetcher {
    replies: Mutex<HashMap<String, VecDeque<MockReply>>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn builder() -> MockFetcherBuilder {
        MockFetcherBuilder {
            replies: HashMap::new(),
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log lock").len()
    }
}

pub struct MockFetcherBuilder {
    replies: HashMap<String, VecDeque<MockReply>>,
}

impl MockFetcherBuilder {
    pub fn with_reply(mut self, url: impl Into<String>, reply: MockReply) -> Self {
        self.replies.entry(url.into()).or_default().push_back(reply);
        self
    }

    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_reply(url, MockReply::body(body))
    }

    pub fn build(self) -> MockFetcher {
        MockFetcher {
            replies: Mutex::new(self.replies),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CoreError> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(url.to_owned());

        let reply = {
            let mut replies = self.replies.lock().expect("reply table lock");
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Body(body)) => classify_response(url, 200, body),
            Some(MockReply::Status(status)) => classify_response(url, status, String::new()),
            None => classify_response(url, 404, String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_consumed_in_order_and_last_repeats() {
        let fetcher = MockFetcher::builder()
            .with_reply("u", MockReply::rate_limited())
            .with_body("u", "ok")
            .build();

        assert!(matches!(
            fetcher.fetch("u").await,
            Err(CoreError::RateLimited { .. })
        ));
        assert_eq!(fetcher.fetch("u").await.expect("second reply"), "ok");
        assert_eq!(fetcher.fetch("u").await.expect("repeated reply"), "ok");
        assert_eq!(fetcher.request_count(), 3);
    }

    #[tokio::test]
    async fn unknown_url_is_not_found() {
        let fetcher = MockFetcher::builder().build();
        let err = fetcher.fetch("missing").await.expect_err("must 404");
        assert!(matches!(err, CoreError::UpstreamStatus { status: 404, .. }));
        assert_eq!(fetcher.requests(), vec!["missing".to_owned()]);
    }
}
