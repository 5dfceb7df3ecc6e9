use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A piece of text with its script formatting.
///
/// Superscript and subscript are conventionally exclusive; when both are set the renderer
/// gives superscript precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,

    #[serde(default, rename = "superscript", skip_serializing_if = "is_false")]
    pub is_superscript: bool,

    #[serde(default, rename = "subscript", skip_serializing_if = "is_false")]
    pub is_subscript: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl TextFragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn superscript(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_superscript: true,
            is_subscript: false,
        }
    }

    pub fn subscript(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_superscript: false,
            is_subscript: true,
        }
    }

    pub fn is_script(&self) -> bool {
        self.is_superscript || self.is_subscript
    }
}

/// Ordered styled fragments. An empty sequence means "clear the content".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedValue {
    pub fragments: Vec<TextFragment>,
}

impl FormattedValue {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn from_plain_text(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![TextFragment::plain(text)],
        }
    }

    pub fn plain_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FromIterator<TextFragment> for FormattedValue {
    fn from_iter<I: IntoIterator<Item = TextFragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

/// Value supplied for one placeholder tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Plain(String),
    Formatted(FormattedValue),
}

impl FillValue {
    pub fn plain_text(&self) -> String {
        match self {
            FillValue::Plain(s) => s.clone(),
            FillValue::Formatted(f) => f.plain_text(),
        }
    }
}

impl From<&str> for FillValue {
    fn from(s: &str) -> Self {
        FillValue::Plain(s.to_string())
    }
}

impl From<String> for FillValue {
    fn from(s: String) -> Self {
        FillValue::Plain(s)
    }
}

impl From<FormattedValue> for FillValue {
    fn from(v: FormattedValue) -> Self {
        FillValue::Formatted(v)
    }
}

/// Mapping from placeholder tag to fill value.
///
/// A missing key leaves the placeholder untouched; an explicit empty value clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillData {
    values: BTreeMap<String, FillValue>,
}

impl FillData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<FillValue>) {
        self.values.insert(tag.into(), value.into());
    }

    pub fn with(mut self, tag: impl Into<String>, value: impl Into<FillValue>) -> Self {
        self.insert(tag, value);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&FillValue> {
        self.values.get(tag)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<FillValue>> FromIterator<(K, V)> for FillData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
