use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// How siblings of a keyed sequence are matched between the old and new tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correlation {
    /// Match elements by the value of the named field. Reordering is reported
    /// as `moved`.
    ByIdentity(String),
    /// Match elements by index. Reordering shows up as content changes, never
    /// as moves.
    ByPosition,
}

impl Default for Correlation {
    fn default() -> Self {
        Self::ByIdentity("id".to_string())
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByIdentity(field) => write!(f, "identity({field})"),
            Self::ByPosition => f.write_str("position"),
        }
    }
}

/// Configuration passed to every comparison.
///
/// Values deserialized from a configuration file bypass the builders, so call
/// [`DiffOptions::validate`] before use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    correlation: Correlation,
    children_field: Option<String>,
    ignored_fields: BTreeSet<String>,
    label_field: Option<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            correlation: Correlation::default(),
            children_field: Some("children".to_string()),
            ignored_fields: BTreeSet::new(),
            label_field: None,
        }
    }
}

impl DiffOptions {
    /// Returns the sibling correlation strategy.
    ///
    /// ```
    /// # use treediff_core::{Correlation, DiffOptions};
    /// assert_eq!(DiffOptions::default().correlation(), &Correlation::ByIdentity("id".into()));
    /// ```
    #[must_use]
    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    /// Returns the identity field when correlating by identity.
    #[must_use]
    pub fn identity_field(&self) -> Option<&str> {
        match &self.correlation {
            Correlation::ByIdentity(field) => Some(field),
            Correlation::ByPosition => None,
        }
    }

    /// Returns the field holding nested keyed sequences.
    #[must_use]
    pub fn children_field(&self) -> Option<&str> {
        self.children_field.as_deref()
    }

    /// Returns the fields excluded from equality and change detection.
    #[must_use]
    pub fn ignored_fields(&self) -> &BTreeSet<String> {
        &self.ignored_fields
    }

    /// Returns the field used to build business paths.
    #[must_use]
    pub fn label_field(&self) -> Option<&str> {
        self.label_field.as_deref()
    }

    /// Fields a keyed-tree comparison never reports as changed: the ignored
    /// fields plus the identity and children fields.
    #[must_use]
    pub fn structural_exclusions(&self) -> BTreeSet<String> {
        let mut excluded = self.ignored_fields.clone();
        excluded.extend(self.identity_field().map(str::to_string));
        excluded.extend(self.children_field.clone());
        excluded
    }

    /// Sets the correlation strategy.
    ///
    /// ```
    /// # use treediff_core::{Correlation, DiffOptions};
    /// let opts = DiffOptions::default().with_correlation(Correlation::ByPosition)?;
    /// assert_eq!(opts.identity_field(), None);
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_correlation(mut self, correlation: Correlation) -> Result<Self, OptionsError> {
        self.correlation = correlation;
        self.validate()?;
        Ok(self)
    }

    /// Correlates keyed siblings by the named field.
    ///
    /// ```
    /// # use treediff_core::DiffOptions;
    /// let opts = DiffOptions::default().with_identity_field("key")?;
    /// assert_eq!(opts.identity_field(), Some("key"));
    /// assert!(DiffOptions::default().with_identity_field(" ").is_err());
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_identity_field(self, field: impl Into<String>) -> Result<Self, OptionsError> {
        self.with_correlation(Correlation::ByIdentity(field.into()))
    }

    /// Sets the children field.
    ///
    /// ```
    /// # use treediff_core::DiffOptions;
    /// let opts = DiffOptions::default().with_children_field("items")?;
    /// assert_eq!(opts.children_field(), Some("items"));
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_children_field(mut self, field: impl Into<String>) -> Result<Self, OptionsError> {
        self.children_field = Some(field.into());
        self.validate()?;
        Ok(self)
    }

    /// Sets the correlation strategy and the children field together, checking
    /// the invariants once both are in place.
    ///
    /// ```
    /// # use treediff_core::{Correlation, DiffOptions};
    /// let opts = DiffOptions::default()
    ///     .with_structure(Correlation::ByIdentity("children".into()), Some("kids".into()))?;
    /// assert_eq!(opts.identity_field(), Some("children"));
    /// assert_eq!(opts.children_field(), Some("kids"));
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_structure(
        mut self,
        correlation: Correlation,
        children_field: Option<String>,
    ) -> Result<Self, OptionsError> {
        self.correlation = correlation;
        self.children_field = children_field;
        self.validate()?;
        Ok(self)
    }

    /// Disables recursion into a children field.
    #[must_use]
    pub fn without_children_field(mut self) -> Self {
        self.children_field = None;
        self
    }

    /// Adds fields to the ignore list.
    ///
    /// ```
    /// # use treediff_core::DiffOptions;
    /// let opts = DiffOptions::default().with_ignored_fields(["updatedAt", "etag"])?;
    /// assert!(opts.ignored_fields().contains("etag"));
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_ignored_fields<I, S>(mut self, fields: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields.extend(fields.into_iter().map(Into::into));
        self.validate()?;
        Ok(self)
    }

    /// Sets the label field used for business paths.
    ///
    /// ```
    /// # use treediff_core::DiffOptions;
    /// let opts = DiffOptions::default().with_label_field("title")?;
    /// assert_eq!(opts.label_field(), Some("title"));
    /// # Ok::<(), treediff_core::OptionsError>(())
    /// ```
    pub fn with_label_field(mut self, field: impl Into<String>) -> Result<Self, OptionsError> {
        self.label_field = Some(field.into());
        self.validate()?;
        Ok(self)
    }

    /// Checks the invariants the builders enforce.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(field) = self.identity_field() {
            ensure_not_blank(field, "identity")?;
        }
        if let Some(field) = self.children_field() {
            ensure_not_blank(field, "children")?;
        }
        if let Some(field) = self.label_field() {
            ensure_not_blank(field, "label")?;
        }
        for field in &self.ignored_fields {
            ensure_not_blank(field, "ignored")?;
        }
        if let (Some(identity), Some(children)) = (self.identity_field(), self.children_field()) {
            if identity == children {
                return Err(OptionsError::IdentityIsChildren(identity.to_string()));
            }
        }
        Ok(())
    }
}

fn ensure_not_blank(field: &str, role: &'static str) -> Result<(), OptionsError> {
    if field.trim().is_empty() {
        Err(OptionsError::BlankField(role))
    } else {
        Ok(())
    }
}
