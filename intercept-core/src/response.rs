//! Substituted response returned to the host in place of a network fetch

use std::fmt;
use std::io::Read;

use crate::assets::AssetStream;

/// Response built fresh for every matching request.
///
/// The body stream belongs to the caller, which reads and drops it. A `None`
/// body is the degraded form produced when the asset could not be opened.
pub struct InterceptedResponse {
    pub mime_type: String,
    pub encoding: String,
    pub body: Option<AssetStream>,
}

impl InterceptedResponse {
    pub fn new(mime_type: impl Into<String>, encoding: impl Into<String>, body: Option<AssetStream>) -> Self {
        Self {
            mime_type: mime_type.into(),
            encoding: encoding.into(),
            body,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// `Content-Type` header value, e.g. `image/png; charset=utf-8`.
    pub fn content_type(&self) -> String {
        if self.encoding.is_empty() {
            self.mime_type.clone()
        } else {
            format!("{}; charset={}", self.mime_type, self.encoding)
        }
    }

    /// Take ownership of the body stream, leaving the response without one.
    pub fn take_body(&mut self) -> Option<AssetStream> {
        self.body.take()
    }

    /// Drain the body into memory. Returns `Ok(None)` for a degraded response.
    pub fn read_body(mut self) -> std::io::Result<Option<Vec<u8>>> {
        match self.body.take() {
            Some(mut stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(Some(buf))
            }
            None => Ok(None),
        }
    }
}

impl fmt::Debug for InterceptedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedResponse")
            .field("mime_type", &self.mime_type)
            .field("encoding", &self.encoding)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_content_type_includes_charset() {
        let resp = InterceptedResponse::new("image/png", "utf-8", None);
        assert_eq!(resp.content_type(), "image/png; charset=utf-8");

        let resp = InterceptedResponse::new("image/png", "", None);
        assert_eq!(resp.content_type(), "image/png");
    }

    #[test]
    fn test_read_body() {
        let resp = InterceptedResponse::new(
            "image/png",
            "utf-8",
            Some(Box::new(Cursor::new(vec![1u8, 2, 3]))),
        );
        assert!(resp.has_body());
        assert_eq!(resp.read_body().unwrap(), Some(vec![1, 2, 3]));

        let degraded = InterceptedResponse::new("image/png", "utf-8", None);
        assert_eq!(degraded.read_body().unwrap(), None);
    }

    #[test]
    fn test_take_body() {
        let mut resp = InterceptedResponse::new(
            "image/png",
            "utf-8",
            Some(Box::new(Cursor::new(Vec::<u8>::new()))),
        );
        assert!(resp.take_body().is_some());
        assert!(!resp.has_body());
    }
}
