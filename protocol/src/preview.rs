//! Resolve a canonical message for display or delivery.
//!
//! Resolution never mutates the canonical string: bound variables are substituted, unbound ones
//! are kept as their literal `[[key]]` token, and portfolio links become absolute URLs.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::segment::Segment;
use crate::segment::Token;
use crate::segment::parse;
use crate::variables::VariableBindings;

/// Base URLs and known short-link codes used to rewrite portfolio links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkResolver {
    portfolio_base_url: String,
    short_link_base_url: Option<String>,
    short_codes: HashMap<String, String>,
}

impl LinkResolver {
    pub fn new(portfolio_base_url: impl Into<String>) -> Self {
        Self {
            portfolio_base_url: portfolio_base_url.into(),
            short_link_base_url: None,
            short_codes: HashMap::new(),
        }
    }

    pub fn with_short_link_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.short_link_base_url = Some(base_url.into());
        self
    }

    /// Remember a resolved short-link code for `slug`.
    pub fn insert_short_code(&mut self, slug: impl Into<String>, code: impl Into<String>) {
        self.short_codes.insert(slug.into(), code.into());
    }

    pub fn short_code(&self, slug: &str) -> Option<&str> {
        self.short_codes.get(slug).map(String::as_str)
    }

    /// Absolute URL for a portfolio. Uses the short link when both a code and a short-link base
    /// are known, otherwise the slug-based deep link.
    pub fn portfolio_url(&self, slug: &str) -> String {
        match (self.short_link_base_url.as_deref(), self.short_code(slug)) {
            (Some(base), Some(code)) => join_url(base, code),
            _ => join_url(&self.portfolio_base_url, slug),
        }
    }
}

fn join_url(base: &str, tail: &str) -> String {
    format!("{}/{tail}", base.trim_end_matches('/'))
}

/// A displayable unit of a resolved message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSegment {
    Text(String),
    Bound { key: String, value: String },
    Unbound { key: String },
    Link { slug: String, url: String },
}

impl PreviewSegment {
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            PreviewSegment::Text(text) => Cow::Borrowed(text),
            PreviewSegment::Bound { value, .. } => Cow::Borrowed(value),
            PreviewSegment::Unbound { key } => {
                Cow::Owned(Token::Variable(key.clone()).to_string())
            }
            PreviewSegment::Link { url, .. } => Cow::Borrowed(url),
        }
    }
}

pub fn resolve_preview(
    canonical: &str,
    bindings: &VariableBindings,
    links: &LinkResolver,
) -> Vec<PreviewSegment> {
    parse(canonical)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text { value } => PreviewSegment::Text(value),
            Segment::Variable { key } => match bindings.resolve(&key) {
                Some(value) => PreviewSegment::Bound {
                    value: value.to_string(),
                    key,
                },
                None => PreviewSegment::Unbound { key },
            },
            Segment::PortfolioLink { slug } => PreviewSegment::Link {
                url: links.portfolio_url(&slug),
                slug,
            },
        })
        .collect()
}

/// The fully resolved text handed to the send collaborator.
pub fn resolve_text(canonical: &str, bindings: &VariableBindings, links: &LinkResolver) -> String {
    resolve_preview(canonical, bindings, links)
        .iter()
        .map(PreviewSegment::display_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn links() -> LinkResolver {
        LinkResolver::new("https://estudio.example/portafolio/")
            .with_short_link_base_url("https://estudio.example/s")
    }

    #[test]
    fn bound_keys_substitute_and_unbound_stay_literal() {
        let bindings = VariableBindings::new().with("nombre_contacto", "Ana");
        let text = resolve_text(
            "Hola [[nombre_contacto]], tu evento es [[nombre_evento]]",
            &bindings,
            &links(),
        );
        insta::assert_snapshot!(text, @"Hola Ana, tu evento es [[nombre_evento]]");
    }

    #[test]
    fn portfolio_link_falls_back_to_slug_url() {
        let segments = resolve_preview(
            "Mira [[link_portafolio:boda-ana]]",
            &VariableBindings::new(),
            &links(),
        );
        assert_eq!(
            segments,
            vec![
                PreviewSegment::Text("Mira ".to_string()),
                PreviewSegment::Link {
                    slug: "boda-ana".to_string(),
                    url: "https://estudio.example/portafolio/boda-ana".to_string(),
                },
            ]
        );
    }

    #[test]
    fn portfolio_link_prefers_short_code_when_known() {
        let mut links = links();
        links.insert_short_code("boda-ana", "abc123");
        assert_eq!(
            resolve_text("[[link_portafolio:boda-ana]]", &VariableBindings::new(), &links),
            "https://estudio.example/s/abc123"
        );
    }

    #[test]
    fn short_code_without_short_base_uses_slug_url() {
        let mut links = LinkResolver::new("https://estudio.example/p");
        links.insert_short_code("boda-ana", "abc123");
        assert_eq!(
            links.portfolio_url("boda-ana"),
            "https://estudio.example/p/boda-ana"
        );
    }

    #[test]
    fn preview_leaves_canonical_untouched() {
        let canonical = "Hola [[nombre_contacto]]".to_string();
        let bindings = VariableBindings::new().with("nombre_contacto", "Ana");
        let _ = resolve_preview(&canonical, &bindings, &links());
        assert_eq!(canonical, "Hola [[nombre_contacto]]");
    }
}
