//! Partial (ajax) result: named content sections plus head resources.

use crate::head::HeadResource;

/// A named, independently-routable part of a partial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name; client-side script routes the content by it.
    pub name: String,
    /// Rendered content of the section.
    pub content: String,
}

impl Section {
    /// Create a named section.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The ajax-cycle response value: head resources plus zero or more named
/// sections, as opposed to a full page render.
///
/// Absence of content is not an error; an empty partial still writes an
/// empty body with the declared content type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialResult {
    sections: Vec<Section>,
    head: Vec<HeadResource>,
    content_type: Option<String>,
}

impl PartialResult {
    /// Create an empty partial result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named section.
    pub fn with_section(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sections.push(Section::new(name, content));
        self
    }

    /// Append a head resource declaration.
    pub fn with_head(mut self, resource: HeadResource) -> Self {
        self.head.push(resource);
        self
    }

    /// Override the content type for this partial.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Append another partial's sections and head declarations, keeping
    /// this one's content type unless it was unset.
    pub fn merge(&mut self, other: PartialResult) {
        self.sections.extend(other.sections);
        self.head.extend(other.head);
        if self.content_type.is_none() {
            self.content_type = other.content_type;
        }
    }

    /// Prepend head declarations, keeping their relative order.
    ///
    /// Used by the ajax path to put the target subtree's aggregated
    /// resources ahead of behavior-contributed ones.
    pub fn prepend_head(&mut self, resources: Vec<HeadResource>) {
        let mut head = resources;
        head.append(&mut self.head);
        self.head = head;
    }

    /// Sections in declaration order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Head declarations in declaration order (not yet deduplicated).
    pub fn head_resources(&self) -> &[HeadResource] {
        &self.head
    }

    /// Content type override, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Check whether the partial carries neither sections nor resources.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.head.is_empty()
    }
}
