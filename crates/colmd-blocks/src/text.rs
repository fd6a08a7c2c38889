//! Rich text payload carried by text-bearing blocks.
//!
//! A [`Text`] is an ordered sequence of [`TextRun`]s, each an inserted string
//! with a set of [`TextAttributes`]. Adjacent runs with identical attributes
//! are always coalesced, so two texts with the same visible content and
//! formatting compare equal regardless of how they were assembled.

use std::collections::BTreeMap;

/// Formatting attributes of a text run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextAttributes {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub code: bool,
    /// Link target.
    pub link: Option<String>,
    /// Foreground colour (named colour or CSS value).
    pub color: Option<String>,
    /// Background colour (named colour or CSS value).
    pub background: Option<String>,
    /// Any other `key: value` attribute, kept verbatim.
    pub extra: BTreeMap<String, String>,
}

impl TextAttributes {
    /// Attributes with only `bold` set.
    #[must_use]
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    /// Attributes with only `italic` set.
    #[must_use]
    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    /// Attributes with only `strike` set.
    #[must_use]
    pub fn strike() -> Self {
        Self {
            strike: true,
            ..Self::default()
        }
    }

    /// Attributes with only `code` set.
    #[must_use]
    pub fn code() -> Self {
        Self {
            code: true,
            ..Self::default()
        }
    }

    /// Attributes with only `link` set.
    #[must_use]
    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..Self::default()
        }
    }

    /// Check whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` on top of these attributes.
    ///
    /// Flags set in `other` are switched on, values present in `other`
    /// replace the current ones.
    pub fn merge(&mut self, other: &Self) {
        self.bold |= other.bold;
        self.italic |= other.italic;
        self.strike |= other.strike;
        self.underline |= other.underline;
        self.code |= other.code;
        if other.link.is_some() {
            self.link.clone_from(&other.link);
        }
        if other.color.is_some() {
            self.color.clone_from(&other.color);
        }
        if other.background.is_some() {
            self.background.clone_from(&other.background);
        }
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A run of text sharing one set of attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub insert: String,
    pub attributes: TextAttributes,
}

impl TextRun {
    /// Create a run with the given attributes.
    #[must_use]
    pub fn new(insert: impl Into<String>, attributes: TextAttributes) -> Self {
        Self {
            insert: insert.into(),
            attributes,
        }
    }

    /// Create an unformatted run.
    #[must_use]
    pub fn plain(insert: impl Into<String>) -> Self {
        Self::new(insert, TextAttributes::default())
    }
}

/// Rich text: an ordered list of coalesced runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Text {
    runs: Vec<TextRun>,
}

impl Text {
    /// Create empty text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create text consisting of a single unformatted run.
    #[must_use]
    pub fn plain(insert: impl Into<String>) -> Self {
        let mut text = Self::new();
        text.push(TextRun::plain(insert));
        text
    }

    /// Append a run, merging it into the last run when attributes match.
    ///
    /// Empty runs are dropped.
    pub fn push(&mut self, run: TextRun) {
        if run.insert.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.attributes == run.attributes => last.insert.push_str(&run.insert),
            _ => self.runs.push(run),
        }
    }

    /// Runs in order.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Check whether the text has no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenate all runs, dropping formatting.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.runs.iter().map(|run| run.insert.as_str()).collect()
    }
}

impl FromIterator<TextRun> for Text {
    fn from_iter<I: IntoIterator<Item = TextRun>>(iter: I) -> Self {
        let mut text = Self::new();
        for run in iter {
            text.push(run);
        }
        text
    }
}
