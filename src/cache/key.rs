//! Canonical request description, cache keys and dedup signatures.
//!
//! Query parameters and headers are kept in sorted maps, so two requests that
//! differ only in parameter order produce the same key and signature.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::upstream::RequestOptions;

/// A GET against the backend API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiRequest {
    path: String,
    query: BTreeMap<String, String>,
    options: RequestOptions,
}

impl ApiRequest {
    /// `path` may carry a query string; its pairs are merged into the query map.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (
                p.to_string(),
                form_urlencoded::parse(q.as_bytes()).into_owned().collect(),
            ),
            None => (path, BTreeMap::new()),
        };

        Self {
            path,
            query,
            options: RequestOptions::default(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Path plus encoded, sorted query string, as sent to the backend.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        format!("{}?{}", self.path, serializer.finish())
    }

    /// Cache key: path, query and the headers that shape the response.
    pub fn cache_key(&self) -> String {
        let mut key = self.path_and_query();
        for (name, value) in self.options.headers() {
            key.push('|');
            key.push_str(name);
            key.push('=');
            key.extend(form_urlencoded::byte_serialize(value.as_bytes()));
        }
        key
    }

    /// In-flight signature: method plus everything in the cache key.
    pub fn signature(&self) -> String {
        format!("GET {}", self.cache_key())
    }
}
