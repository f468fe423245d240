//! Validation context and utilities for manifest parsing.

use std::{collections::HashMap, sync::Arc};

use miette::SourceSpan;

use crate::{Result, error::SourceContext};

/// Parsing and validation context that carries source information.
///
/// This struct encapsulates the source content, filename, and current path
/// through the manifest, making it easier to pass validation context into
/// nested sections.
///
/// # Example
///
/// ```ignore
/// let ctx = ParseContext::new(src, "connkit.toml");
/// ctx.validate_name("query", "operation")?;
///
/// let nested = ctx.push("operations").push("query");
/// nested.validate_ident("soql", "parameter")?;
/// ```
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    /// Source context for error reporting (shared across nested contexts)
    source: Arc<SourceContext>,
    /// Path segments for nested validation (e.g., ["operations", "query"])
    path: Vec<&'a str>,
}

impl<'a> ParseContext<'a> {
    /// Create a new parse context with the given source and filename.
    pub fn new(src: &str, filename: &str) -> Self {
        Self {
            source: Arc::new(SourceContext::new(src, filename)),
            path: Vec::new(),
        }
    }

    pub fn src(&self) -> &str {
        self.source.src()
    }

    /// Get the source context for error creation.
    pub fn source_context(&self) -> &SourceContext {
        &self.source
    }

    /// Push a path segment and return a new context.
    pub fn push(&self, segment: &'a str) -> Self {
        let mut new_path = self.path.clone();
        new_path.push(segment);
        Self {
            source: Arc::clone(&self.source),
            path: new_path,
        }
    }

    /// Get the current path as a dot-separated string.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Get a context description for error messages.
    ///
    /// For example: "parameter in 'operations.query'" or just "operation" if no path.
    pub fn context_for(&self, kind: &str) -> String {
        if self.path.is_empty() {
            kind.to_string()
        } else {
            format!("{} in '{}'", kind, self.path_string())
        }
    }

    /// Find the span of a name in the source.
    pub fn find_span(&self, name: &str) -> Option<SourceSpan> {
        find_name_span(self.source.src(), name)
    }

    /// Validate a name that may contain dashes (converted to snake_case later).
    pub fn validate_name(&self, name: &str, kind: &str) -> Result<()> {
        self.check(name, kind, validate_identifier(name, true))
    }

    /// Validate a name that is used verbatim as a Rust identifier.
    pub fn validate_ident(&self, name: &str, kind: &str) -> Result<()> {
        self.check(name, kind, validate_identifier(name, false))
    }

    /// Validate a Rust type path such as `crate::client::Salesforce`.
    pub fn validate_path(&self, path: &str, kind: &str) -> Result<()> {
        let span = find_value_span(self.source.src(), path);
        let mut segments = path.split("::").enumerate().peekable();

        if segments.peek().is_none() {
            return Err(self.source.invalid_identifier_error(
                path,
                self.context_for(kind),
                "path cannot be empty",
                span,
            ));
        }

        for (i, segment) in segments {
            if i == 0 && matches!(segment, "crate" | "self" | "super") {
                continue;
            }
            if let Some(reason) = validate_identifier(segment, false) {
                return Err(self.source.invalid_identifier_error(
                    path,
                    self.context_for(kind),
                    reason,
                    span,
                ));
            }
        }

        Ok(())
    }

    /// Reject repeated names, pointing at the first and second declaration.
    pub fn check_unique<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
        kind: &str,
    ) -> Result<()> {
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for name in names {
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            if *count == 2 {
                let spans = find_name_spans(self.source.src(), name);
                return Err(self.source.duplicate_error(
                    name,
                    self.context_for(kind),
                    spans.first().copied(),
                    spans.get(1).copied(),
                ));
            }
        }

        Ok(())
    }

    /// Create a validation error at the location of `needle`, if found.
    pub fn error_at(&self, message: impl Into<String>, needle: &str) -> Box<crate::Error> {
        let span = find_name_span(self.source.src(), needle)
            .or_else(|| find_value_span(self.source.src(), needle));
        self.source.validation_error(message, span)
    }

    fn check(&self, name: &str, kind: &str, reason: Option<&'static str>) -> Result<()> {
        if is_rust_keyword(name) {
            return Err(self.source.reserved_keyword_error(
                name,
                self.context_for(kind),
                self.find_span(name),
            ));
        }

        if let Some(reason) = reason {
            return Err(self.source.invalid_identifier_error(
                name,
                self.context_for(kind),
                reason,
                self.find_span(name),
            ));
        }

        Ok(())
    }
}

/// Rust reserved keywords that cannot be used as identifiers
/// Source: https://doc.rust-lang.org/reference/keywords.html
pub(crate) const RUST_KEYWORDS: &[&str] = &[
    // Strict keywords
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
    // Reserved keywords
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield",
    // Weak keywords
    "union",
];

/// Check if a name is a Rust reserved keyword
pub(crate) fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}

/// Find the span of the first `name = "..."` entry with the given value.
pub(crate) fn find_name_span(src: &str, name: &str) -> Option<SourceSpan> {
    find_name_spans(src, name).into_iter().next()
}

/// Find the spans of every `name = "..."` entry with the given value.
pub(crate) fn find_name_spans(src: &str, name: &str) -> Vec<SourceSpan> {
    let mut spans = Vec::new();
    for quote in ['"', '\''] {
        let pattern = format!("name = {quote}{name}{quote}");
        // The name starts after 'name = "' (8 characters)
        spans.extend(
            src.match_indices(&pattern)
                .map(|(pos, _)| SourceSpan::from((pos + 8, name.len()))),
        );
    }
    spans.sort_by_key(|span| span.offset());
    spans
}

/// Find the span of a quoted string value anywhere in the source.
pub(crate) fn find_value_span(src: &str, value: &str) -> Option<SourceSpan> {
    let pattern = format!("\"{}\"", value);
    src.find(&pattern)
        .map(|pos| SourceSpan::from((pos + 1, value.len())))
}

/// Validate that a name is a valid Rust identifier.
/// Returns None if valid, Some(reason) if invalid.
///
/// With `allow_dashes`, names like "get-account" are accepted; they are
/// converted to snake_case during code generation.
pub(crate) fn validate_identifier(name: &str, allow_dashes: bool) -> Option<&'static str> {
    if name.is_empty() {
        return Some("name cannot be empty");
    }

    if is_rust_keyword(name) {
        return Some("name is a Rust reserved keyword");
    }

    let snake_case = name.replace('-', "_");
    if is_rust_keyword(&snake_case) {
        return Some("name converts to a Rust reserved keyword");
    }

    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Some("name must start with a letter or underscore"),
        None => return Some("name cannot be empty"),
    }

    let mut prev_was_dash = false;

    for c in chars {
        if c == '-' && allow_dashes {
            if prev_was_dash {
                return Some("name cannot contain consecutive dashes");
            }
            prev_was_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            prev_was_dash = false;
        } else if c == '-' {
            return Some("name must not contain dashes");
        } else {
            return Some("name must contain only letters, numbers, and underscores");
        }
    }

    if prev_was_dash {
        return Some("name cannot end with a dash");
    }

    None
}
