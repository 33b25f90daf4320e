//! Effect queues: the ordered stages of one pipeline run.

use serde::{Deserialize, Serialize};
use tincture_core::EffectOptions;

/// One stage: an effect name and the options it runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    name: String,
    #[serde(default)]
    options: EffectOptions,
}

impl EffectSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, EffectOptions::new())
    }

    pub fn with_options(name: impl Into<String>, options: EffectOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &EffectOptions {
        &self.options
    }
}

/// Ordered list of stages. Stage 0 reads the job input, each later stage
/// reads the output of the one before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectQueue(Vec<EffectSpec>);

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage with default options.
    pub fn then(self, name: impl Into<String>) -> Self {
        self.then_with(name, EffectOptions::new())
    }

    /// Append a stage with explicit options.
    pub fn then_with(mut self, name: impl Into<String>, options: EffectOptions) -> Self {
        self.push(EffectSpec::with_options(name, options));
        self
    }

    pub fn push(&mut self, spec: EffectSpec) {
        self.0.push(spec);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EffectSpec> {
        self.0.iter()
    }

    /// Parse `[{"name": "blur", "options": {"kernelSize": 5}}, ...]`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl FromIterator<EffectSpec> for EffectQueue {
    fn from_iter<I: IntoIterator<Item = EffectSpec>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EffectQueue {
    type Item = &'a EffectSpec;
    type IntoIter = std::slice::Iter<'a, EffectSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let queue = EffectQueue::new()
            .then("invert")
            .then_with("blur", EffectOptions::new().with("kernelSize", 5))
            .then("sepia");
        let names: Vec<_> = queue.iter().map(EffectSpec::name).collect();
        assert_eq!(names, ["invert", "blur", "sepia"]);
        assert_eq!(queue.len(), 3);
        assert_eq!(
            queue.iter().nth(1).and_then(|s| s.options().number("kernelSize")),
            Some(5.0)
        );
    }

    #[test]
    fn test_from_json() {
        let queue = EffectQueue::from_json(
            r#"[{"name":"blur","options":{"kernelSize":7}},{"name":"invert"}]"#,
        )
        .unwrap();
        assert_eq!(queue.len(), 2);
        let specs: Vec<_> = queue.iter().collect();
        assert_eq!(specs[0].name(), "blur");
        assert_eq!(specs[0].options().number("kernelSize"), Some(7.0));
        assert!(specs[1].options().is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(EffectQueue::from_json(r#"{"name":"blur"}"#).is_err());
    }

    #[test]
    fn test_collect_from_specs() {
        let queue: EffectQueue = ["a", "b"].into_iter().map(EffectSpec::new).collect();
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());
        assert!(EffectQueue::new().is_empty());
    }
}
