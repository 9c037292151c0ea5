//! Response seam between the engine and the transport collaborator.

use crate::error::EngineResult;

/// Reply channel the engine writes into.
///
/// The raw HTTP transport is a collaborator; the engine only needs a byte
/// sink that carries a content type and headers.
pub trait ResponseSink {
    /// Set a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Write the response body with the given content type.
    fn write(&mut self, bytes: &[u8], content_type: &str) -> EngineResult<()>;
}

/// In-memory sink capturing everything written, for tests and for the
/// simulated cycles of the mock harness.
#[derive(Debug, Default)]
pub struct BufferSink {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    content_type: Option<String>,
    writes: usize,
}

impl BufferSink {
    /// Create an empty buffer sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Captured body as UTF-8 (lossy).
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Content type of the last write, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Headers set so far, in order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the first header with the given name, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of body writes performed.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ResponseSink for BufferSink {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write(&mut self, bytes: &[u8], content_type: &str) -> EngineResult<()> {
        self.body.extend_from_slice(bytes);
        self.content_type = Some(content_type.to_string());
        self.set_header(http::header::CONTENT_TYPE.as_str(), content_type);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_captures_writes() {
        let mut sink = BufferSink::new();
        sink.write(b"<p>hi</p>", "text/html; charset=UTF-8").unwrap();

        assert_eq!(sink.body_str(), "<p>hi</p>");
        assert_eq!(sink.content_type(), Some("text/html; charset=UTF-8"));
        assert_eq!(sink.writes(), 1);
        assert_eq!(sink.header("content-type"), Some("text/html; charset=UTF-8"));
    }

    #[test]
    fn test_buffer_sink_empty_write_keeps_content_type() {
        let mut sink = BufferSink::new();
        sink.write(b"", "text/plain").unwrap();

        assert!(sink.body().is_empty());
        assert_eq!(sink.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_buffer_sink_headers_ordered() {
        let mut sink = BufferSink::new();
        sink.set_header("X-First", "1");
        sink.set_header("X-Second", "2");

        assert_eq!(sink.headers()[0].0, "X-First");
        assert_eq!(sink.header("x-second"), Some("2"));
    }
}
