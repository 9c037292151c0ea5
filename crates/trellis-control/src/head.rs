//! Head resources (scripts/styles) and their aggregation rules.

use std::collections::HashSet;

use crate::arena::{ControlArena, ControlId};

/// A declared script/style dependency contributed by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadResource {
    /// External script reference, unique by source path.
    JsImport { src: String },
    /// External stylesheet reference, unique by href.
    CssImport { href: String },
    /// Inline script block; unique by the explicit id when present,
    /// otherwise never deduplicated.
    JsScript { id: Option<String>, source: String },
    /// Inline style block; unique by the explicit id when present,
    /// otherwise never deduplicated.
    CssStyle { id: Option<String>, source: String },
}

/// Key under which a head resource deduplicates, when it does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniquenessKey {
    /// Resources carrying an explicit identity attribute.
    Identity(String),
    /// Import-kind resources without an identity, keyed by source path.
    Source(String),
}

impl HeadResource {
    /// External script import.
    pub fn js_import(src: impl Into<String>) -> Self {
        Self::JsImport { src: src.into() }
    }

    /// External stylesheet import.
    pub fn css_import(href: impl Into<String>) -> Self {
        Self::CssImport { href: href.into() }
    }

    /// Inline script without an identity (never deduplicated).
    pub fn js_script(source: impl Into<String>) -> Self {
        Self::JsScript {
            id: None,
            source: source.into(),
        }
    }

    /// Inline script with an explicit identity.
    pub fn js_script_with_id(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::JsScript {
            id: Some(id.into()),
            source: source.into(),
        }
    }

    /// Inline style without an identity (never deduplicated).
    pub fn css_style(source: impl Into<String>) -> Self {
        Self::CssStyle {
            id: None,
            source: source.into(),
        }
    }

    /// Inline style with an explicit identity.
    pub fn css_style_with_id(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::CssStyle {
            id: Some(id.into()),
            source: source.into(),
        }
    }

    /// Key this resource deduplicates under, if any.
    ///
    /// Explicit identity wins over the import rule; resources with neither
    /// return `None` and may legitimately render more than once.
    pub fn uniqueness_key(&self) -> Option<UniquenessKey> {
        match self {
            Self::JsScript { id: Some(id), .. } | Self::CssStyle { id: Some(id), .. } => {
                Some(UniquenessKey::Identity(id.clone()))
            }
            Self::JsImport { src } => Some(UniquenessKey::Source(src.clone())),
            Self::CssImport { href } => Some(UniquenessKey::Source(href.clone())),
            Self::JsScript { id: None, .. } | Self::CssStyle { id: None, .. } => None,
        }
    }

    /// Render the resource as head markup.
    pub fn render(&self) -> String {
        match self {
            Self::JsImport { src } => format!(r#"<script src="{src}"></script>"#),
            Self::CssImport { href } => {
                format!(r#"<link rel="stylesheet" href="{href}"/>"#)
            }
            Self::JsScript { id: Some(id), source } => {
                format!(r#"<script id="{id}">{source}</script>"#)
            }
            Self::JsScript { id: None, source } => format!("<script>{source}</script>"),
            Self::CssStyle { id: Some(id), source } => {
                format!(r#"<style id="{id}">{source}</style>"#)
            }
            Self::CssStyle { id: None, source } => format!("<style>{source}</style>"),
        }
    }
}

/// Apply the uniqueness rules to an ordered declaration sequence.
///
/// Within the same uniqueness class the first declaration wins and keeps
/// the position it was first seen at; later declarations are suppressed.
/// Keyless resources always pass through.
pub fn dedup_resources(declared: Vec<HeadResource>) -> Vec<HeadResource> {
    let mut seen: HashSet<UniquenessKey> = HashSet::new();
    let mut out = Vec::with_capacity(declared.len());
    for resource in declared {
        match resource.uniqueness_key() {
            Some(key) => {
                if seen.insert(key) {
                    out.push(resource);
                }
            }
            None => out.push(resource),
        }
    }
    out
}

/// Render a deduplicated resource list as one head block.
pub fn render_head_block(resources: &[HeadResource]) -> String {
    resources
        .iter()
        .map(HeadResource::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merges the head-resource declarations of a control subtree into one
/// deduplicated, ordered sequence.
///
/// Idempotent per scope within a cycle: the sequence is computed once for
/// a given scope and cached, because computing it can itself trigger lazy
/// resource attachment inside controls. Asking for a different scope
/// recomputes.
#[derive(Debug, Default)]
pub struct HeadAggregator {
    cached: Option<(ControlId, Vec<HeadResource>)>,
}

impl HeadAggregator {
    /// Create an aggregator for one cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate the subtree rooted at `scope`.
    ///
    /// Full cycles pass the page root; ajax cycles pass the target's
    /// subtree so declarations already in the browser are not resent.
    pub fn aggregate(&mut self, arena: &ControlArena, scope: ControlId) -> Vec<HeadResource> {
        if let Some((cached_scope, resources)) = &self.cached {
            if *cached_scope == scope {
                return resources.clone();
            }
        }
        let mut declared = Vec::new();
        for id in arena.walk(scope) {
            declared.extend(arena.control(id).head_resources());
        }
        let resources = dedup_resources(declared);
        self.cached = Some((scope, resources.clone()));
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;

    struct WithHead(Vec<HeadResource>);
    impl Control for WithHead {
        fn head_resources(&self) -> Vec<HeadResource> {
            self.0.clone()
        }
    }

    // === Dedup Rule Tests ===

    #[test]
    fn test_identity_rule_first_declaration_wins() {
        let out = dedup_resources(vec![
            HeadResource::js_script_with_id("x", "var a = 1;"),
            HeadResource::js_import("/js/app.js"),
            HeadResource::js_script_with_id("x", "var a = 2;"),
        ]);

        assert_eq!(out.len(), 2);
        // First occurrence keeps its position and its content.
        assert_eq!(out[0], HeadResource::js_script_with_id("x", "var a = 1;"));
        assert_eq!(out[1], HeadResource::js_import("/js/app.js"));
    }

    #[test]
    fn test_import_rule_same_source_collapses() {
        let out = dedup_resources(vec![
            HeadResource::js_import("/js/shared.js"),
            HeadResource::css_import("/css/site.css"),
            HeadResource::js_import("/js/shared.js"),
        ]);

        assert_eq!(
            out,
            vec![
                HeadResource::js_import("/js/shared.js"),
                HeadResource::css_import("/css/site.css"),
            ]
        );
    }

    #[test]
    fn test_keyless_inline_blocks_never_dedup() {
        let out = dedup_resources(vec![
            HeadResource::css_style("p { margin: 0 }"),
            HeadResource::css_style("p { margin: 0 }"),
        ]);

        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_identity_wins_over_import_kind() {
        // Same explicit id on two inline scripts with different content.
        let first = HeadResource::css_style_with_id("theme", ".a{}");
        let second = HeadResource::css_style_with_id("theme", ".b{}");
        let out = dedup_resources(vec![first.clone(), second]);

        assert_eq!(out, vec![first]);
    }

    // === Render Tests ===

    #[test]
    fn test_render_markup() {
        assert_eq!(
            HeadResource::js_import("/js/a.js").render(),
            r#"<script src="/js/a.js"></script>"#
        );
        assert_eq!(
            HeadResource::css_import("/css/a.css").render(),
            r#"<link rel="stylesheet" href="/css/a.css"/>"#
        );
        assert_eq!(
            HeadResource::js_script_with_id("boot", "go();").render(),
            r#"<script id="boot">go();</script>"#
        );
    }

    // === Aggregator Tests ===

    fn head_tree() -> (ControlArena, ControlId) {
        let mut arena = ControlArena::new();
        let page = arena
            .insert_root(
                "page",
                Box::new(WithHead(vec![HeadResource::js_import("/js/page.js")])),
            )
            .unwrap();
        let form = arena
            .insert(
                page,
                "form",
                Box::new(WithHead(vec![
                    HeadResource::js_import("/js/form.js"),
                    HeadResource::js_import("/js/page.js"),
                ])),
            )
            .unwrap();
        arena
            .insert(
                form,
                "field",
                Box::new(WithHead(vec![HeadResource::css_import("/css/field.css")])),
            )
            .unwrap();
        (arena, page)
    }

    #[test]
    fn test_aggregate_walks_subtree_in_order() {
        let (arena, page) = head_tree();
        let mut aggregator = HeadAggregator::new();

        let resources = aggregator.aggregate(&arena, page);

        assert_eq!(
            resources,
            vec![
                HeadResource::js_import("/js/page.js"),
                HeadResource::js_import("/js/form.js"),
                HeadResource::css_import("/css/field.css"),
            ]
        );
    }

    #[test]
    fn test_aggregate_is_idempotent_within_cycle() {
        let (arena, page) = head_tree();
        let mut aggregator = HeadAggregator::new();

        let first = aggregator.aggregate(&arena, page);
        let second = aggregator.aggregate(&arena, page);

        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_recomputes_for_different_scope() {
        let (arena, page) = head_tree();
        let form = arena.find_by_control_id("page_form").unwrap();
        let mut aggregator = HeadAggregator::new();

        let full = aggregator.aggregate(&arena, page);
        let scoped = aggregator.aggregate(&arena, form);

        // The cached full-page sequence must not leak into the narrower
        // scope.
        assert_eq!(full[0], HeadResource::js_import("/js/page.js"));
        assert_eq!(scoped[0], HeadResource::js_import("/js/form.js"));
        assert_eq!(scoped.len(), 3);
    }

    #[test]
    fn test_aggregate_scopes_to_subtree() {
        let (arena, page) = head_tree();
        let form = arena.find_by_control_id("page_form").unwrap();
        let mut aggregator = HeadAggregator::new();

        let resources = aggregator.aggregate(&arena, form);

        // The page-level import outside the scope is not aggregated; the
        // form's duplicate of it survives because the page copy never
        // entered this cycle's sequence.
        assert_eq!(
            resources,
            vec![
                HeadResource::js_import("/js/form.js"),
                HeadResource::js_import("/js/page.js"),
                HeadResource::css_import("/css/field.css"),
            ]
        );
    }

    #[test]
    fn test_render_head_block_joins_lines() {
        let block = render_head_block(&[
            HeadResource::js_import("/js/a.js"),
            HeadResource::css_import("/css/a.css"),
        ]);

        assert_eq!(
            block,
            "<script src=\"/js/a.js\"></script>\n<link rel=\"stylesheet\" href=\"/css/a.css\"/>"
        );
    }
}
