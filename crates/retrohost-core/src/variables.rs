//! Core option registry.

use crate::error::{HostError, Result};
use std::collections::BTreeMap;
use std::ffi::{c_char, CString};

/// One core option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    key: String,
    description: String,
    choices: Vec<String>,
    value: Option<String>,
}

impl Variable {
    /// Parse a `"description; choice1|choice2|..."` schema string.
    ///
    /// Without the `"; "` separator the description and choice list are empty.
    pub fn parse(key: impl Into<String>, schema: &str) -> Self {
        let (description, choices) = match schema.split_once("; ") {
            Some((description, choices)) => (
                description.to_string(),
                choices
                    .split('|')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        Self {
            key: key.into(),
            description,
            choices,
            value: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Current value, if the frontend set one.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// First choice, which cores treat as their default.
    pub fn default_choice(&self) -> Option<&str> {
        self.choices.first().map(String::as_str)
    }

    pub fn is_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c == value)
    }

    fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }
}

/// Key-ordered option set shared between the core and the frontend.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    entries: BTreeMap<String, Variable>,
    /// NUL-terminated copies of current values handed to the core.
    values: BTreeMap<String, CString>,
    updated: bool,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of `(key, schema)` pairs.
    ///
    /// New keys are added and existing keys get the new schema. A current
    /// value survives only while it is still one of the choices.
    pub fn register_all<I, K, S>(&mut self, schemas: I)
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: AsRef<str>,
    {
        for (key, schema) in schemas {
            let parsed = Variable::parse(key, schema.as_ref());
            let previous = self
                .entries
                .get(parsed.key())
                .and_then(|v| v.value.clone())
                .filter(|v| parsed.is_choice(v));

            if previous.is_none() {
                self.values.remove(parsed.key());
            }
            self.entries
                .insert(parsed.key.clone(), parsed.with_value(previous));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.entries.get(key)
    }

    /// Set a value from the frontend. Marks the registry as updated.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let variable = self
            .entries
            .get(key)
            .ok_or_else(|| HostError::UnknownVariable(key.to_string()))?;

        if !variable.is_choice(value) {
            return Err(HostError::InvalidVariableValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }

        let updated = variable.clone().with_value(Some(value.to_string()));
        self.entries.insert(key.to_string(), updated);
        self.values.remove(key);
        self.updated = true;
        Ok(())
    }

    /// Pointer to the current value for a core lookup, or `None` when the key
    /// is unknown or unset.
    ///
    /// The pointer stays valid until the value changes or the registry drops.
    pub fn value_ptr(&mut self, key: &str) -> Option<*const c_char> {
        let value = self.entries.get(key)?.value()?;
        if !self.values.contains_key(key) {
            let c_value = CString::new(value).ok()?;
            self.values.insert(key.to_string(), c_value);
        }
        self.values.get(key).map(|c| c.as_ptr())
    }

    /// Report and clear the changed-since-last-poll flag.
    pub fn take_update(&mut self) -> bool {
        std::mem::take(&mut self.updated)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.values.clear();
        self.updated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_parse_schema() {
        let var = Variable::parse("snes_region", "Region; Auto|NTSC|PAL");
        assert_eq!(var.key(), "snes_region");
        assert_eq!(var.description(), "Region");
        assert_eq!(var.choices(), ["Auto", "NTSC", "PAL"]);
        assert_eq!(var.default_choice(), Some("Auto"));
        assert_eq!(var.value(), None);
    }

    #[test]
    fn test_parse_without_separator() {
        let var = Variable::parse("broken", "Region Auto|NTSC");
        assert_eq!(var.description(), "");
        assert!(var.choices().is_empty());

        // "; " needs the space
        let var = Variable::parse("tight", "Desc;A|B");
        assert!(var.choices().is_empty());
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let mut registry = VariableRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.value_ptr("missing").is_none());
    }

    #[test]
    fn test_set_value_validates_choice() {
        let mut registry = VariableRegistry::new();
        registry.register_all([("speed", "Speed; 1x|2x")]);

        assert!(matches!(
            registry.set_value("speed", "8x"),
            Err(HostError::InvalidVariableValue { .. })
        ));
        assert!(matches!(
            registry.set_value("other", "1x"),
            Err(HostError::UnknownVariable(_))
        ));
        assert!(!registry.take_update());

        registry.set_value("speed", "2x").unwrap();
        assert_eq!(registry.get("speed").unwrap().value(), Some("2x"));
        assert!(registry.take_update());
        assert!(!registry.take_update());
    }

    #[test]
    fn test_unset_value_has_no_pointer() {
        let mut registry = VariableRegistry::new();
        registry.register_all([("speed", "Speed; 1x|2x")]);
        assert!(registry.value_ptr("speed").is_none());

        registry.set_value("speed", "1x").unwrap();
        let ptr = registry.value_ptr("speed").unwrap();
        let value = unsafe { CStr::from_ptr(ptr) };
        assert_eq!(value.to_str().unwrap(), "1x");
    }

    #[test]
    fn test_reregistration_accumulates() {
        let mut registry = VariableRegistry::new();
        registry.register_all([("a", "A; x|y"), ("b", "B; on|off")]);
        registry.set_value("a", "y").unwrap();
        registry.set_value("b", "off").unwrap();

        // "a" keeps y, "b" loses off, "c" is new
        registry.register_all([("a", "A2; y|z"), ("b", "B2; on|maybe"), ("c", "C; 1|2")]);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("a").unwrap().description(), "A2");
        assert_eq!(registry.get("a").unwrap().value(), Some("y"));
        assert_eq!(registry.get("b").unwrap().value(), None);
        assert!(registry.value_ptr("b").is_none());

        let keys: Vec<_> = registry.iter().map(|v| v.key().to_string()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
