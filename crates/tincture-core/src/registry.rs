//! Effect registry: stable names mapped to transforms with one uniform signature.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::buffer::check_frame;
use crate::builtins::BUILTINS;
use crate::error::EffectError;
use crate::options::{EffectOptions, ParamDef};
use crate::progress::Progress;

/// A named pixel transform.
///
/// Implementations read only `input` and write only `output`; both hold a
/// `width × height` RGBA8 image and are validated before `apply` runs.
pub trait Effect: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Recognized options. Empty for effects that accept any options.
    fn params(&self) -> &[ParamDef] {
        &[]
    }

    /// Run the transform, reporting progress within `[0, 1]`.
    fn apply(
        &self,
        input: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        options: &EffectOptions,
        progress: &mut Progress<'_>,
    ) -> Result<(), EffectError>;
}

type EffectFn = dyn Fn(&[u8], &mut [u8], u32, u32, &EffectOptions, &mut Progress<'_>) -> Result<(), EffectError>
    + Send
    + Sync;

/// Effect backed by a closure, for caller-registered transforms.
pub struct FnEffect {
    name: String,
    run: Box<EffectFn>,
}

impl FnEffect {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&[u8], &mut [u8], u32, u32, &EffectOptions, &mut Progress<'_>) -> Result<(), EffectError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

impl fmt::Debug for FnEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEffect").field("name", &self.name).finish()
    }
}

impl Effect for FnEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        input: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        options: &EffectOptions,
        progress: &mut Progress<'_>,
    ) -> Result<(), EffectError> {
        (self.run)(input, output, width, height, options, progress)
    }
}

/// Validate the frame, run `effect`, and report completion.
pub fn run_effect(
    effect: &dyn Effect,
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    options: &EffectOptions,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    effect.apply(input, output, width, height, options, progress)?;
    progress.finish()
}

/// Registry holding every available effect for lookup by name.
#[derive(Clone)]
pub struct EffectRegistry {
    effects: HashMap<String, Arc<dyn Effect>>,
}

impl EffectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    /// Create a registry with all built-in effects registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in BUILTINS {
            registry.register(Arc::new(*builtin));
        }

        info!(count = registry.effects.len(), "Registered built-in effects");

        registry
    }

    /// Register an effect. Overwrites any previous effect with the same name.
    pub fn register(&mut self, effect: Arc<dyn Effect>) {
        let name = effect.name().to_string();
        self.effects.insert(name, effect);
    }

    /// Try to register an effect, returning an error if one already exists with that name.
    pub fn try_register(&mut self, effect: Arc<dyn Effect>) -> Result<(), EffectError> {
        let name = effect.name().to_string();
        if self.effects.contains_key(&name) {
            return Err(EffectError::AlreadyRegistered { name });
        }
        self.effects.insert(name, effect);
        Ok(())
    }

    /// Register a closure under `name`. Overwrites any previous entry.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, run: F)
    where
        F: Fn(&[u8], &mut [u8], u32, u32, &EffectOptions, &mut Progress<'_>) -> Result<(), EffectError>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnEffect::new(name, run)));
    }

    /// Look up an effect by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Effect>> {
        self.effects.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.effects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run the effect registered as `name` from `input` into `output`.
    ///
    /// `on_progress` receives non-decreasing fractions ending at 1.0.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        name: &str,
        input: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        options: &EffectOptions,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<(), EffectError> {
        let mut progress = Progress::new(on_progress);
        self.apply_with(name, input, output, width, height, options, &mut progress)
    }

    /// Like [`apply`](Self::apply) but reporting into an existing scope.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_with(
        &self,
        name: &str,
        input: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        options: &EffectOptions,
        progress: &mut Progress<'_>,
    ) -> Result<(), EffectError> {
        let effect = self.effects.get(name).ok_or_else(|| EffectError::UnknownEffect {
            name: name.to_string(),
        })?;
        run_effect(effect.as_ref(), input, output, width, height, options, progress)
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    fn quiet() -> impl FnMut(f32) {
        |_| {}
    }

    #[test]
    fn test_empty_registry() {
        let reg = EffectRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.get("invert").is_none());
        assert!(reg.names().is_empty());
    }

    #[test]
    fn test_with_builtins_has_all_effects() {
        let reg = EffectRegistry::with_builtins();
        assert_eq!(reg.len(), BUILTINS.len());
        for name in ["invert", "blur", "glow", "hsl", "findEdges", "flipHorizontal", "laplace5x5"] {
            assert!(reg.contains(name), "missing {name}");
        }
        let names = reg.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_unknown_effect_fails() {
        let reg = EffectRegistry::with_builtins();
        let input = PixelBuffer::new(2, 2);
        let mut output = input.blank_like();
        let err = reg
            .apply(
                "sparkle",
                input.as_bytes(),
                output.as_bytes_mut(),
                2,
                2,
                &EffectOptions::new(),
                &mut quiet(),
            )
            .unwrap_err();
        assert!(matches!(err, EffectError::UnknownEffect { ref name } if name == "sparkle"));
    }

    #[test]
    fn test_try_register_rejects_duplicates() {
        let mut reg = EffectRegistry::with_builtins();
        let dup = FnEffect::new("invert", |_, _, _, _, _, _| Ok(()));
        assert!(matches!(
            reg.try_register(Arc::new(dup)),
            Err(EffectError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_custom_effect_runs_and_completes_progress() {
        let mut reg = EffectRegistry::new();
        reg.register_fn("fill", |_input, output, _w, _h, options, _progress| {
            let v = options.number("value").unwrap_or(0.0) as u8;
            output.fill(v);
            Ok(())
        });

        let input = PixelBuffer::new(2, 1);
        let mut output = input.blank_like();
        let mut seen = Vec::new();
        let mut sink = |p: f32| seen.push(p);
        reg.apply(
            "fill",
            input.as_bytes(),
            output.as_bytes_mut(),
            2,
            1,
            &EffectOptions::new().with("value", 7),
            &mut sink,
        )
        .unwrap();
        assert!(output.as_bytes().iter().all(|b| *b == 7));
        assert_eq!(seen, vec![1.0]);
    }

    #[test]
    fn test_mismatched_frame_is_rejected_before_running() {
        let reg = EffectRegistry::with_builtins();
        let input = [0u8; 16];
        let mut output = [0u8; 8];
        let err = reg
            .apply("invert", &input, &mut output, 2, 2, &EffectOptions::new(), &mut quiet())
            .unwrap_err();
        assert!(matches!(err, EffectError::Buffer(_)));
    }
}
