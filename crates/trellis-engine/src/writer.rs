//! Partial-result writer.

use trellis_control::{dedup_resources, render_head_block, PartialResult};
use trellis_core::{EngineResult, ResponseSink};

/// Writes a [`PartialResult`] to the response sink.
///
/// Emits, in order, the deduplicated head-resource block and then each
/// named section wrapped in machine-parsable separators so client-side
/// script can route every section to its DOM target:
///
/// ```text
/// <!--trellis-head-->
/// <script src="/js/clock.js"></script>
/// <!--/trellis-head-->
/// <!--trellis-section:time-->
/// 12:00
/// <!--/trellis-section:time-->
/// ```
///
/// An empty partial writes an empty body with the declared content type
/// preserved; absence of content is not an error.
#[derive(Debug, Clone)]
pub struct PartialWriter {
    content_type: String,
}

impl PartialWriter {
    /// Create a writer with the default content type for partials.
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }

    /// Render the partial body without writing it.
    pub fn render(&self, partial: &PartialResult) -> String {
        let mut body = String::new();

        let head = dedup_resources(partial.head_resources().to_vec());
        if !head.is_empty() {
            body.push_str("<!--trellis-head-->\n");
            body.push_str(&render_head_block(&head));
            body.push_str("\n<!--/trellis-head-->\n");
        }

        for section in partial.sections() {
            body.push_str(&format!(
                "<!--trellis-section:{name}-->\n{content}\n<!--/trellis-section:{name}-->\n",
                name = section.name,
                content = section.content,
            ));
        }

        body
    }

    /// Write the partial to the sink.
    pub fn write(
        &self,
        partial: &PartialResult,
        sink: &mut dyn ResponseSink,
    ) -> EngineResult<()> {
        let body = self.render(partial);
        let content_type = partial.content_type().unwrap_or(&self.content_type);
        sink.write(body.as_bytes(), content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_control::HeadResource;
    use trellis_core::BufferSink;

    fn writer() -> PartialWriter {
        PartialWriter::new("text/html; charset=UTF-8")
    }

    #[test]
    fn test_sections_wrapped_in_named_separators() {
        let partial = PartialResult::new().with_section("time", "12:00");
        let mut sink = BufferSink::new();

        writer().write(&partial, &mut sink).unwrap();

        assert_eq!(
            sink.body_str(),
            "<!--trellis-section:time-->\n12:00\n<!--/trellis-section:time-->\n"
        );
    }

    #[test]
    fn test_head_block_precedes_sections() {
        let partial = PartialResult::new()
            .with_section("clock", "<span>12:00</span>")
            .with_head(HeadResource::js_import("/js/clock.js"));
        let mut sink = BufferSink::new();

        writer().write(&partial, &mut sink).unwrap();

        let body = sink.body_str();
        let head_at = body.find("<!--trellis-head-->").unwrap();
        let section_at = body.find("<!--trellis-section:clock-->").unwrap();
        assert!(head_at < section_at);
        assert!(body.contains(r#"<script src="/js/clock.js"></script>"#));
    }

    #[test]
    fn test_head_block_applies_uniqueness_rules() {
        let partial = PartialResult::new()
            .with_head(HeadResource::js_import("/js/shared.js"))
            .with_head(HeadResource::js_import("/js/shared.js"));
        let mut sink = BufferSink::new();

        writer().write(&partial, &mut sink).unwrap();

        assert_eq!(sink.body_str().matches("/js/shared.js").count(), 1);
    }

    #[test]
    fn test_empty_partial_writes_empty_body_with_content_type() {
        let mut sink = BufferSink::new();

        writer().write(&PartialResult::new(), &mut sink).unwrap();

        assert!(sink.body().is_empty());
        assert_eq!(sink.content_type(), Some("text/html; charset=UTF-8"));
    }

    #[test]
    fn test_partial_content_type_override_wins() {
        let partial = PartialResult::new().with_content_type("application/json");
        let mut sink = BufferSink::new();

        writer().write(&partial, &mut sink).unwrap();

        assert_eq!(sink.content_type(), Some("application/json"));
    }
}
