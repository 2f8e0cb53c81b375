use super::{Outcome, json_to_cel};
use crate::policy::{InputValues, VARIABLES_ROOT};

/// Names visible to expressions during one evaluation run
///
/// Entries are append-only and kept in insertion order. Lookups return the most
/// recent entry for a name; nothing is ever removed or reordered.
#[derive(Debug, Clone, Default)]
pub struct BindingEnvironment {
    entries: Vec<(String, Outcome)>,
}

impl BindingEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment holding every input root.
    #[must_use]
    pub fn seed(inputs: &InputValues) -> Self {
        let mut env = Self::new();
        for (name, doc) in inputs.roots() {
            env.bind(name, Outcome::Value(json_to_cel(&doc)));
        }
        env
    }

    pub fn bind(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.entries.push((name.into(), outcome));
    }

    /// Bind a policy variable under `variables.<name>`.
    pub fn bind_variable(&mut self, name: &str, outcome: Outcome) {
        self.bind(variable_key(name), outcome);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries.iter().rev().find(|(n, _)| n == name).map(|(_, outcome)| outcome)
    }

    /// Look up a policy variable by its bare name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Outcome> {
        self.get(&variable_key(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn variable_key(name: &str) -> String {
    format!("{VARIABLES_ROOT}.{name}")
}
