//! Marked YAML node tree.

use crate::parse_util::SourceSpan;

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` or `>` block scalar.
    Block,
}

/// A mapping key with its own span.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlKey {
    pub text: String,
    pub span: SourceSpan,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// Empty value (`key:` with nothing after it).
    Null,
    Scalar(String, ScalarStyle),
    Sequence(Vec<YamlNode>),
    /// Order-preserving; duplicate keys are reported by the reader and the
    /// first occurrence wins.
    Mapping(Vec<(YamlKey, YamlNode)>),
}

/// A YAML node with the span it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub value: YamlValue,
    pub span: SourceSpan,
}

impl YamlNode {
    pub fn new(value: YamlValue, span: SourceSpan) -> Self {
        YamlNode { value, span }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, YamlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            YamlValue::Scalar(s, _) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.value {
            YamlValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(YamlKey, YamlNode)]> {
        match &self.value {
            YamlValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping entry by key.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.text == key)
            .map(|(_, v)| v)
    }

    /// Short description used in schema error messages.
    pub fn type_name(&self) -> &'static str {
        match &self.value {
            YamlValue::Null => "null",
            YamlValue::Scalar(..) => "scalar",
            YamlValue::Sequence(_) => "sequence",
            YamlValue::Mapping(_) => "mapping",
        }
    }
}
