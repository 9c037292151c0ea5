//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::context::TARGET_PARAM;

/// Configuration for a lifecycle engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Application name.
    pub name: String,
    /// Character set appended to the content type.
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Content type of full and partial renders.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Request parameter carrying the ajax target control id.
    #[serde(default = "default_target_param")]
    pub target_param: String,
}

fn default_charset() -> String {
    "UTF-8".to_string()
}

fn default_content_type() -> String {
    "text/html".to_string()
}

fn default_target_param() -> String {
    TARGET_PARAM.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("trellis")
    }
}

impl EngineConfig {
    /// Create a configuration with the given application name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charset: default_charset(),
            content_type: default_content_type(),
            target_param: default_target_param(),
        }
    }

    /// Set the character set.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Override the ajax target parameter name.
    pub fn with_target_param(mut self, param: impl Into<String>) -> Self {
        self.target_param = param.into();
        self
    }

    /// Full content type including the charset, e.g.
    /// `text/html; charset=UTF-8`.
    pub fn full_content_type(&self) -> String {
        format!("{}; charset={}", self.content_type, self.charset)
    }
}
