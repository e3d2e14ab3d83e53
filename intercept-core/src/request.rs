//! Resource request descriptor
//!
//! The richer of the two call shapes hands the interceptor a full request
//! descriptor instead of a bare URL. Only the URL takes part in matching.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    /// True when the request loads the top-level document rather than a subresource
    pub is_for_main_frame: bool,
}

impl ResourceRequest {
    /// A plain subresource `GET` for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            is_for_main_frame: false,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn for_main_frame(mut self, is_for_main_frame: bool) -> Self {
        self.is_for_main_frame = is_for_main_frame;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
