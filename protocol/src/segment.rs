//! Canonical message strings and the segments they parse into.
//!
//! A canonical message is literal text interleaved with bracketed placeholder tokens, either
//! `[[variable_key]]` or `[[link_portafolio:<slug>]]`. The canonical string is the only form that
//! is persisted; segments are derived from it on demand.
//!
//! Parsing is permissive: anything between `[[` and `]]` that is not a well-formed token stays
//! literal text, so [`parse`] never fails and [`serialize`] always reproduces the input.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Prefix that marks a portfolio link token (`[[link_portafolio:<slug>]]`).
pub const PORTFOLIO_LINK_PREFIX: &str = "link_portafolio:";

const TOKEN_OPEN: &str = "[[";
const TOKEN_CLOSE: &str = "]]";

/// A parsed unit of a canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, including whitespace and newlines, exactly as written.
    Text { value: String },
    /// A variable placeholder such as `[[nombre_contacto]]`.
    Variable { key: String },
    /// A link to a portfolio gallery, `[[link_portafolio:<slug>]]`.
    PortfolioLink { slug: String },
}

impl Segment {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn variable(key: impl Into<String>) -> Self {
        Self::Variable { key: key.into() }
    }

    pub fn portfolio_link(slug: impl Into<String>) -> Self {
        Self::PortfolioLink { slug: slug.into() }
    }

    /// Returns true for segments that render as atomic chips.
    pub fn is_chip(&self) -> bool {
        !matches!(self, Self::Text { .. })
    }

    fn write_raw(&self, out: &mut String) {
        match self {
            Self::Text { value } => out.push_str(value),
            Self::Variable { key } => {
                out.push_str(TOKEN_OPEN);
                out.push_str(key);
                out.push_str(TOKEN_CLOSE);
            }
            Self::PortfolioLink { slug } => {
                out.push_str(TOKEN_OPEN);
                out.push_str(PORTFOLIO_LINK_PREFIX);
                out.push_str(slug);
                out.push_str(TOKEN_CLOSE);
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = String::new();
        self.write_raw(&mut raw);
        f.write_str(&raw)
    }
}

/// A chip-shaped token that can be inserted into a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Variable(String),
    PortfolioLink(String),
}

impl Token {
    /// Interpret the text between `[[` and `]]`. Returns `None` for malformed content.
    pub fn from_inner(inner: &str) -> Option<Self> {
        if let Some(slug) = inner.strip_prefix(PORTFOLIO_LINK_PREFIX) {
            return is_portfolio_slug(slug).then(|| Self::PortfolioLink(slug.to_string()));
        }
        is_variable_key(inner).then(|| Self::Variable(inner.to_string()))
    }

    /// Whether the token serializes to a span that [`parse`] reads back as the same token.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Variable(key) => is_variable_key(key),
            Self::PortfolioLink(slug) => is_portfolio_slug(slug),
        }
    }

    pub fn into_segment(self) -> Segment {
        match self {
            Self::Variable(key) => Segment::Variable { key },
            Self::PortfolioLink(slug) => Segment::PortfolioLink { slug },
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(key) => write!(f, "{TOKEN_OPEN}{key}{TOKEN_CLOSE}"),
            Self::PortfolioLink(slug) => {
                write!(f, "{TOKEN_OPEN}{PORTFOLIO_LINK_PREFIX}{slug}{TOKEN_CLOSE}")
            }
        }
    }
}

/// Variable keys are non-empty runs of ASCII alphanumerics and underscores.
pub fn is_variable_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Portfolio slugs are non-empty and contain no whitespace or brackets.
pub fn is_portfolio_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug
            .chars()
            .any(|c| c.is_whitespace() || c == '[' || c == ']')
}

/// Tokenize a canonical message.
///
/// The result is never empty: an empty input yields a single empty text segment. Text segments
/// are never adjacent to each other, and no text segment is empty unless it is the only segment.
pub fn parse(canonical: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(open_rel) = canonical[cursor..].find(TOKEN_OPEN) {
        let open = cursor + open_rel;
        let inner_start = open + TOKEN_OPEN.len();
        let Some(close_rel) = canonical[inner_start..].find(TOKEN_CLOSE) else {
            break;
        };
        let close = inner_start + close_rel;

        match Token::from_inner(&canonical[inner_start..close]) {
            Some(token) => {
                if text_start < open {
                    segments.push(Segment::text(&canonical[text_start..open]));
                }
                segments.push(token.into_segment());
                cursor = close + TOKEN_CLOSE.len();
                text_start = cursor;
            }
            // `[` is one byte, so stepping past it keeps `cursor` on a char boundary. This also
            // lets `[[[key]]` resolve to a literal `[` followed by a variable.
            None => cursor = open + 1,
        }
    }

    if text_start < canonical.len() {
        segments.push(Segment::text(&canonical[text_start..]));
    }
    if segments.is_empty() {
        segments.push(Segment::text(""));
    }
    segments
}

/// Concatenate the raw form of every segment.
pub fn serialize(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        segment.write_raw(&mut out);
    }
    out
}

/// Merge adjacent text segments and drop empty ones, keeping the list non-empty.
pub fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Text { value } if value.is_empty() => {}
            Segment::Text { value } => match out.last_mut() {
                Some(Segment::Text { value: prev }) => prev.push_str(&value),
                _ => out.push(Segment::Text { value }),
            },
            chip => out.push(chip),
        }
    }
    if out.is_empty() {
        out.push(Segment::text(""));
    }
    out
}

/// Whether appending a chip after `canonical` needs a separating space first.
pub fn needs_leading_separator(canonical: &str) -> bool {
    canonical
        .chars()
        .next_back()
        .is_some_and(|last| !last.is_whitespace())
}

/// Append `token` to a canonical string without any editable surface.
///
/// Applies the same spacing rule as the composer: one space before the token unless the content
/// is empty or already ends in whitespace, and one trailing space after it.
pub fn append_token_to_canonical(canonical: &str, token: &Token) -> String {
    let mut out = String::with_capacity(canonical.len() + 32);
    out.push_str(canonical);
    if needs_leading_separator(canonical) {
        out.push(' ');
    }
    out.push_str(&token.to_string());
    out.push(' ');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_text_variables_and_links() {
        let segments = parse("Hola [[nombre_contacto]], mira [[link_portafolio:boda-ana]]!\n");
        assert_eq!(
            segments,
            vec![
                Segment::text("Hola "),
                Segment::variable("nombre_contacto"),
                Segment::text(", mira "),
                Segment::portfolio_link("boda-ana"),
                Segment::text("!\n"),
            ]
        );
    }

    #[test]
    fn empty_input_yields_single_empty_text() {
        assert_eq!(parse(""), vec![Segment::text("")]);
    }

    #[test]
    fn malformed_tokens_stay_literal() {
        for input in [
            "[[]]",
            "[[con espacio]]",
            "[[link_portafolio:]]",
            "[[link_portafolio:a b]]",
            "abierto [[nombre",
            "cerrado ]] solo",
            "[[ñandu]]",
        ] {
            assert_eq!(parse(input), vec![Segment::text(input)], "input: {input:?}");
        }
    }

    #[test]
    fn extra_open_bracket_is_literal_prefix() {
        assert_eq!(
            parse("[[[fecha_evento]]]"),
            vec![
                Segment::text("["),
                Segment::variable("fecha_evento"),
                Segment::text("]"),
            ]
        );
    }

    #[test]
    fn adjacent_tokens_have_no_text_between() {
        assert_eq!(
            parse("[[a]][[b]]"),
            vec![Segment::variable("a"), Segment::variable("b")]
        );
    }

    #[test]
    fn serialize_reconstructs_input_exactly() {
        let inputs = [
            "",
            "solo texto",
            "  espacios \t y\nlineas\r\n",
            "Hola [[nombre_contacto]], tu evento es [[nombre_evento]]",
            "[[link_portafolio:boda-ana]]",
            "[[[x]]] [[ mal ]] [[link_portafolio:]] [[",
            "emoji 📸 [[fecha_evento]] ñ",
        ];
        for input in inputs {
            assert_eq!(serialize(&parse(input)), input, "input: {input:?}");
        }
    }

    #[test]
    fn normalize_merges_text_and_keeps_list_non_empty() {
        let merged = normalize(vec![
            Segment::text("a"),
            Segment::text(""),
            Segment::text("b"),
            Segment::variable("k"),
            Segment::text(""),
        ]);
        assert_eq!(merged, vec![Segment::text("ab"), Segment::variable("k")]);
        assert_eq!(normalize(Vec::new()), vec![Segment::text("")]);
    }

    #[test]
    fn fallback_append_spacing() {
        let token = Token::Variable("nombre_contacto".to_string());
        assert_eq!(
            append_token_to_canonical("", &token),
            "[[nombre_contacto]] "
        );
        assert_eq!(
            append_token_to_canonical("Hola", &token),
            "Hola [[nombre_contacto]] "
        );
        assert_eq!(
            append_token_to_canonical("Hola ", &token),
            "Hola [[nombre_contacto]] "
        );
        assert_eq!(
            append_token_to_canonical("Hola\n", &token),
            "Hola\n[[nombre_contacto]] "
        );
    }

    #[test]
    fn fallback_append_stays_parseable() {
        let canonical = append_token_to_canonical(
            &append_token_to_canonical("Mira", &Token::PortfolioLink("boda-ana".to_string())),
            &Token::Variable("link_promesa".to_string()),
        );
        insta::assert_snapshot!(
            canonical.trim_end(),
            @"Mira [[link_portafolio:boda-ana]] [[link_promesa]]"
        );
        assert_eq!(
            parse(&canonical),
            vec![
                Segment::text("Mira "),
                Segment::portfolio_link("boda-ana"),
                Segment::text(" "),
                Segment::variable("link_promesa"),
                Segment::text(" "),
            ]
        );
    }

    #[test]
    fn segments_serialize_with_type_tag() {
        let json = serde_json::to_string(&Segment::portfolio_link("boda-ana")).expect("encode");
        assert_eq!(json, r#"{"type":"portfolio_link","slug":"boda-ana"}"#);
    }

    #[test]
    fn well_formed_tokens_round_trip_through_parse() {
        for token in [
            Token::Variable("nombre_contacto".to_string()),
            Token::PortfolioLink("boda-ana".to_string()),
            Token::Variable("mal key".to_string()),
            Token::PortfolioLink("boda ana".to_string()),
            Token::PortfolioLink(String::new()),
        ] {
            let parsed = parse(&token.to_string());
            let reads_back = parsed == vec![token.clone().into_segment()];
            assert_eq!(reads_back, token.is_well_formed(), "{token}");
        }
    }
}
