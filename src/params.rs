// ============================================================================
// PARAMETER STORE — brightness / contrast / saturation / greyscale
// ============================================================================
//
// The store never validates: whatever a slider or the CLI hands over is kept
// as-is and passed straight to the pipeline.  Every mutation raises a render
// request that the controller consumes.
// ============================================================================

use std::fmt;

/// Immutable snapshot of all four filter parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    /// Additive offset applied after contrast.
    pub brightness: f32,
    /// Multiplier around zero.
    pub contrast: f32,
    /// 0 = grey, 1 = unchanged, >1 = boosted.
    pub saturation: f32,
    pub greyscale: bool,
}

impl FilterParams {
    pub const DEFAULT: Self = Self {
        brightness: 0.0,
        contrast: 1.0,
        saturation: 1.0,
        greyscale: false,
    };

    /// True when rendering with these parameters leaves every pixel untouched.
    pub fn is_identity(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "brightness={:.3} contrast={:.3} saturation={:.3} greyscale={}",
            self.brightness, self.contrast, self.saturation, self.greyscale
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamField {
    Brightness,
    Contrast,
    Saturation,
    Greyscale,
}

impl ParamField {
    pub fn label(self) -> &'static str {
        match self {
            ParamField::Brightness => "Brightness",
            ParamField::Contrast => "Contrast",
            ParamField::Saturation => "Saturation",
            ParamField::Greyscale => "Greyscale",
        }
    }
}

/// A value headed for one of the fields.  Floats sent to the greyscale flag
/// mean "on" when non-zero; flags sent to float fields become 1.0 / 0.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Flag(bool),
}

impl ParamValue {
    fn as_f32(self) -> f32 {
        match self {
            ParamValue::Float(v) => v,
            ParamValue::Flag(true) => 1.0,
            ParamValue::Flag(false) => 0.0,
        }
    }

    fn as_flag(self) -> bool {
        match self {
            ParamValue::Float(v) => v != 0.0,
            ParamValue::Flag(b) => b,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

#[derive(Debug, Default)]
pub struct ParameterStore {
    current: FilterParams,
    revision: u64,
    render_requested: bool,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: FilterParams) -> Self {
        Self {
            current: params,
            revision: 0,
            render_requested: false,
        }
    }

    pub fn set(&mut self, field: ParamField, value: impl Into<ParamValue>) {
        let value = value.into();
        match field {
            ParamField::Brightness => self.current.brightness = value.as_f32(),
            ParamField::Contrast => self.current.contrast = value.as_f32(),
            ParamField::Saturation => self.current.saturation = value.as_f32(),
            ParamField::Greyscale => self.current.greyscale = value.as_flag(),
        }
        self.touch();
    }

    pub fn toggle_greyscale(&mut self) {
        let on = !self.current.greyscale;
        self.set(ParamField::Greyscale, on);
    }

    /// Restore startup defaults.
    pub fn reset(&mut self) {
        self.current = FilterParams::DEFAULT;
        self.touch();
    }

    pub fn snapshot(&self) -> FilterParams {
        self.current
    }

    /// Number of mutations since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` once per pending render request.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.render_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_defaults() {
        let store = ParameterStore::new();
        let p = store.snapshot();
        assert_eq!(p.brightness, 0.0);
        assert_eq!(p.contrast, 1.0);
        assert_eq!(p.saturation, 1.0);
        assert!(!p.greyscale);
        assert!(p.is_identity());
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let mut store = ParameterStore::new();
        store.set(ParamField::Brightness, 7.5);
        store.set(ParamField::Contrast, -2.0);
        store.set(ParamField::Saturation, 40.0);
        let p = store.snapshot();
        assert_eq!(p.brightness, 7.5);
        assert_eq!(p.contrast, -2.0);
        assert_eq!(p.saturation, 40.0);

        store.set(ParamField::Contrast, f32::NAN);
        assert!(store.snapshot().contrast.is_nan());
    }

    #[test]
    fn snapshot_is_detached_from_later_updates() {
        let mut store = ParameterStore::new();
        store.set(ParamField::Brightness, 0.25);
        let before = store.snapshot();
        store.set(ParamField::Brightness, -0.5);
        assert_eq!(before.brightness, 0.25);
        assert_eq!(store.snapshot().brightness, -0.5);
    }

    #[test]
    fn mixed_value_kinds_are_coerced() {
        let mut store = ParameterStore::new();
        store.set(ParamField::Greyscale, 1.0);
        assert!(store.snapshot().greyscale);
        store.set(ParamField::Greyscale, 0.0);
        assert!(!store.snapshot().greyscale);
        store.set(ParamField::Saturation, false);
        assert_eq!(store.snapshot().saturation, 0.0);
    }

    #[test]
    fn every_mutation_requests_a_render() {
        let mut store = ParameterStore::new();
        assert!(!store.take_render_request());
        store.toggle_greyscale();
        assert_eq!(store.revision(), 1);
        assert!(store.take_render_request());
        assert!(!store.take_render_request());

        for field in [
            ParamField::Brightness,
            ParamField::Contrast,
            ParamField::Saturation,
            ParamField::Greyscale,
        ] {
            store.set(field, 1.0);
        }
        assert_eq!(store.revision(), 5);
        assert!(store.take_render_request());
    }

    #[test]
    fn toggle_and_reset() {
        let mut store = ParameterStore::new();
        store.toggle_greyscale();
        assert!(store.snapshot().greyscale);
        store.toggle_greyscale();
        assert!(!store.snapshot().greyscale);

        store.set(ParamField::Contrast, 2.0);
        store.set(ParamField::Greyscale, true);
        store.reset();
        assert_eq!(store.snapshot(), FilterParams::DEFAULT);
    }
}
