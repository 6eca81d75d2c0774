//! Lookup requests.

/// A key to resolve, with optional `{name}` replacements.
///
/// Parameters are applied in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatorText {
    /// Fully-qualified key (`prefix.key` or bare `key`)
    pub key: String,

    /// `(name, replacement)` pairs substituted for `{name}`
    pub parameters: Vec<(String, String)>,
}

impl TranslatorText {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parameters: Vec::new(),
        }
    }

    /// Add one replacement for `{name}`.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Add several replacements at once.
    pub fn with_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.extend(
            parameters
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Replace every literal `{name}` in `template` with its value.
    ///
    /// Placeholders without a matching parameter are left as they are.
    pub fn apply(&self, template: &str) -> String {
        self.parameters
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

impl From<&str> for TranslatorText {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for TranslatorText {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&String> for TranslatorText {
    fn from(key: &String) -> Self {
        Self::new(key.as_str())
    }
}

impl From<&TranslatorText> for TranslatorText {
    fn from(text: &TranslatorText) -> Self {
        text.clone()
    }
}
