//! Scripted fetcher shared by the crawler unit tests

use crate::crawler::fetcher::{FetchError, PageBody, PageFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves canned bodies; any URL without an entry answers HTTP 404
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Vec<Result<String, u16>>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages
            .entry(url.to_string())
            .or_default()
            .push(Ok(body.to_string()));
        self
    }

    pub fn status(mut self, url: &str, code: u16) -> Self {
        self.pages
            .entry(url.to_string())
            .or_default()
            .push(Err(code));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageBody, FetchError> {
        let attempt = {
            let mut requested = self.requested.lock().unwrap();
            requested.push(url.to_string());
            requested.iter().filter(|u| *u == url.as_str()).count() - 1
        };

        let responses = self.pages.get(url.as_str());
        let response = responses
            .and_then(|r| r.get(attempt).or_else(|| r.last()))
            .cloned()
            .unwrap_or(Err(404));

        match response {
            Ok(html) => Ok(PageBody {
                url: url.clone(),
                html,
            }),
            Err(code) => Err(FetchError::HttpStatus {
                url: url.to_string(),
                code,
            }),
        }
    }
}
