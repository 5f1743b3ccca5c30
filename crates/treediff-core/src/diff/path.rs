use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{DiffOptions, Node, PathError};

/// Represents a single element within a diff path.
///
/// ```
/// # use treediff_core::diff::PathSegment;
/// let key = PathSegment::key("name");
/// let index = PathSegment::index(2);
/// assert!(matches!(key, PathSegment::Key(_)));
/// assert!(matches!(index, PathSegment::Index(2)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key lookup.
    Key(String),
    /// Array index lookup.
    Index(usize),
}

impl PathSegment {
    /// Creates a key segment.
    #[must_use]
    pub fn key<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Self::Key(value.into())
    }

    /// Creates an index segment.
    #[must_use]
    pub fn index(value: usize) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Location of a diff node within a document.
///
/// The textual form is `a.b[2].c`. Keys that are empty or contain characters
/// outside `[A-Za-z0-9_$-]` are written bracket-quoted, as in `a["x.y"]`, so
/// every path parses back to the same segments.
///
/// ```
/// # use treediff_core::diff::{Path, PathSegment};
/// let path = Path::new()
///     .with_segment(PathSegment::key("menu"))
///     .with_segment(PathSegment::index(2))
///     .with_segment(PathSegment::key("title"));
/// assert_eq!(path.to_string(), "menu[2].title");
/// assert_eq!("menu[2].title".parse::<Path>()?, path);
/// # Ok::<(), treediff_core::PathError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new segment, returning the extended path.
    #[must_use]
    pub fn with_segment(mut self, segment: PathSegment) -> Self {
        self.0.push(segment);
        self
    }

    /// Returns the underlying segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether the path is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Pushes a new segment in-place.
    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Pops the last segment off the path.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Display form with ` > ` separators, e.g. `menu > [2] > title`.
    ///
    /// ```
    /// # use treediff_core::diff::Path;
    /// let path: Path = "a[0].b".parse()?;
    /// assert_eq!(path.readable(), "a > [0] > b");
    /// # Ok::<(), treediff_core::PathError>(())
    /// ```
    #[must_use]
    pub fn readable(&self) -> String {
        self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join(" > ")
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(value: Vec<PathSegment>) -> Self {
        Self(value)
    }
}

impl From<PathSegment> for Path {
    fn from(value: PathSegment) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) if is_plain_key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => {
                    f.write_str("[\"")?;
                    for ch in key.chars() {
                        if ch == '"' || ch == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{ch}")?;
                    }
                    f.write_str("\"]")?;
                }
            }
        }
        Ok(())
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_plain_char)
}

fn is_plain_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '-')
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut chars = input.char_indices().peekable();

        while let Some(&(offset, ch)) = chars.peek() {
            match ch {
                '[' => {
                    chars.next();
                    if chars.peek().is_some_and(|&(_, c)| c == '"') {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some((_, '\\')) => match chars.next() {
                                    Some((_, escaped)) => key.push(escaped),
                                    None => return Err(PathError::Unterminated { offset }),
                                },
                                Some((_, '"')) => break,
                                Some((_, c)) => key.push(c),
                                None => return Err(PathError::Unterminated { offset }),
                            }
                        }
                        match chars.next() {
                            Some((_, ']')) => segments.push(PathSegment::Key(key)),
                            Some((at, found)) => {
                                return Err(PathError::UnexpectedChar { found, offset: at })
                            }
                            None => return Err(PathError::Unterminated { offset }),
                        }
                    } else {
                        let mut text = String::new();
                        loop {
                            match chars.next() {
                                Some((_, ']')) => break,
                                Some((_, c)) => text.push(c),
                                None => return Err(PathError::Unterminated { offset }),
                            }
                        }
                        let index =
                            text.parse::<usize>().map_err(|_| PathError::InvalidIndex { text })?;
                        segments.push(PathSegment::Index(index));
                    }
                }
                '.' if !segments.is_empty() => {
                    chars.next();
                    let key = take_plain_key(&mut chars);
                    if key.is_empty() {
                        return Err(PathError::EmptyKey { offset: offset + 1 });
                    }
                    segments.push(PathSegment::Key(key));
                }
                c if segments.is_empty() && is_plain_char(c) => {
                    segments.push(PathSegment::Key(take_plain_key(&mut chars)));
                }
                found => return Err(PathError::UnexpectedChar { found, offset }),
            }
        }

        Ok(Self(segments))
    }
}

fn take_plain_key(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut key = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_plain_char(c) {
            break;
        }
        key.push(c);
        chars.next();
    }
    key
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Path {
    type Item = PathSegment;
    type IntoIter = std::vec::IntoIter<PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Paths of the node currently being visited.
///
/// `old` and `new` only diverge in keyed-tree mode, where a correlated node
/// can sit at different indices on each side. `business` holds the label
/// trail; children-field hops never contribute to it.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathState {
    old: Path,
    new: Path,
    business: Vec<String>,
}

impl PathState {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    /// Descends into an object field holding `value`.
    pub(crate) fn key(&self, key: &str, value: &Node, options: &DiffOptions) -> Self {
        let mut next = self.clone();
        next.old.push(PathSegment::key(key));
        next.new.push(PathSegment::key(key));
        if options.children_field() != Some(key) {
            next.business.push(label_or(value, options, || key.to_string()));
        }
        next
    }

    /// Descends into an array element holding `value`.
    pub(crate) fn index(&self, index: usize, value: &Node, options: &DiffOptions) -> Self {
        self.element(Some(index), Some(index), value, format!("[{index}]"), options)
    }

    /// Descends into a keyed element that sits at `old_index` / `new_index`.
    /// `fallback` labels the element when it has no label field.
    pub(crate) fn element(
        &self,
        old_index: Option<usize>,
        new_index: Option<usize>,
        value: &Node,
        fallback: String,
        options: &DiffOptions,
    ) -> Self {
        let mut next = self.clone();
        if let Some(index) = old_index.or(new_index) {
            next.old.push(PathSegment::Index(index));
        }
        if let Some(index) = new_index.or(old_index) {
            next.new.push(PathSegment::Index(index));
        }
        next.business.push(label_or(value, options, || fallback));
        next
    }

    /// Hops through the children field without adding a business label.
    pub(crate) fn children(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.old.push(PathSegment::key(field));
        next.new.push(PathSegment::key(field));
        next
    }

    pub(crate) fn old_path(&self) -> &Path {
        &self.old
    }

    pub(crate) fn new_path(&self) -> &Path {
        &self.new
    }

    pub(crate) fn business_path(&self) -> String {
        self.business.join(" > ")
    }
}

fn label_or(value: &Node, options: &DiffOptions, fallback: impl FnOnce() -> String) -> String {
    options.label_field().and_then(|field| value.label(field)).unwrap_or_else(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: Vec<PathSegment>) -> Path {
        Path::from(segments)
    }

    #[test]
    fn serde_uses_textual_form() {
        let path = path(vec![PathSegment::key("foo"), PathSegment::index(3)]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"foo[3]\"");
        let decoded: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, path);
    }

    #[test]
    fn root_and_leading_index_render() {
        assert_eq!(Path::new().to_string(), "");
        let path = path(vec![PathSegment::index(0), PathSegment::key("children")]);
        assert_eq!(path.to_string(), "[0].children");
    }

    #[test]
    fn unusual_keys_are_quoted_and_parse_back() {
        let path = path(vec![
            PathSegment::key("a.b"),
            PathSegment::key(""),
            PathSegment::key("say \"hi\""),
            PathSegment::key("plain"),
        ]);
        let text = path.to_string();
        assert_eq!(text, r#"["a.b"][""]["say \"hi\""].plain"#);
        assert_eq!(text.parse::<Path>().unwrap(), path);
    }

    #[test]
    fn parse_errors_report_location() {
        assert_eq!(
            "a..b".parse::<Path>().unwrap_err(),
            PathError::EmptyKey { offset: 2 }
        );
        assert_eq!("a[1".parse::<Path>().unwrap_err(), PathError::Unterminated { offset: 1 });
        assert_eq!(
            "a[x]".parse::<Path>().unwrap_err(),
            PathError::InvalidIndex { text: "x".into() }
        );
        assert_eq!(
            ".a".parse::<Path>().unwrap_err(),
            PathError::UnexpectedChar { found: '.', offset: 0 }
        );
        assert_eq!(
            "a b".parse::<Path>().unwrap_err(),
            PathError::UnexpectedChar { found: ' ', offset: 1 }
        );
    }

    #[test]
    fn business_trail_uses_labels_and_skips_children_hop() {
        let options = DiffOptions::default().with_label_field("name").unwrap();
        let labelled = Node::from_json_str("{\"name\":\"Settings\"}").unwrap();
        let plain = Node::from_json_str("{\"x\":1}").unwrap();

        let state = PathState::root()
            .element(Some(1), Some(0), &labelled, "7".into(), &options)
            .children("children")
            .element(Some(2), Some(2), &plain, "9".into(), &options);

        assert_eq!(state.new_path().to_string(), "[0].children[2]");
        assert_eq!(state.old_path().to_string(), "[1].children[2]");
        assert_eq!(state.business_path(), "Settings > 9");

        let generic = PathState::root().key("children", &plain, &options).index(0, &labelled, &options);
        assert_eq!(generic.new_path().to_string(), "children[0]");
        assert_eq!(generic.business_path(), "Settings");
    }
}
