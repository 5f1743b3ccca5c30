use thiserror::Error;

use crate::diff::Path;

/// Errors that can occur while canonicalizing external data into [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// YAML maps may only contain string keys.
    #[error("unsupported YAML key type: {found}")]
    NonStringYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// Tagged YAML values have no counterpart in the tree model.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Errors emitted when constructing [`DiffOptions`](crate::DiffOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// A configured field name was empty or whitespace.
    #[error("{0} field name must not be blank")]
    BlankField(&'static str),
    /// The identity field doubles as the children field.
    #[error("identity field `{0}` cannot also be the children field")]
    IdentityIsChildren(String),
}

/// Errors reported by the strict duplicate-identity pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Two siblings share the same identity value.
    #[error("duplicate identity {identity} at {path}")]
    DuplicateIdentity {
        /// Display form of the repeated identity value.
        identity: String,
        /// Location of the later duplicate.
        path: Path,
    },
}

/// Errors produced while parsing a textual [`Path`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A character that cannot start or continue a segment.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset into the input.
        offset: usize,
    },
    /// A bracketed segment was not closed.
    #[error("unterminated segment starting at offset {offset}")]
    Unterminated {
        /// Byte offset of the opening bracket.
        offset: usize,
    },
    /// A bracketed index was not a valid unsigned integer.
    #[error("invalid index {text:?}")]
    InvalidIndex {
        /// The text between the brackets.
        text: String,
    },
    /// A dotted key had no characters.
    #[error("empty key at offset {offset}")]
    EmptyKey {
        /// Byte offset where the key was expected.
        offset: usize,
    },
}
