//! Modifier pipeline - the single evaluation law for tagged adjustments
//!
//! `apply(base, mods) = (base + Σ additive) × Π multiplicative`
//!
//! Additive modifiers are always summed before any multiplicative modifier is
//! applied, so a multiplicative 0 zeroes the result no matter what was added.
//! Sum and product are commutative; callers may pass modifiers in any order.

use serde::{Deserialize, Serialize};

/// Magnitude of a modifier, tagged by how it combines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "magnitude", rename_all = "snake_case")]
pub enum ModifierValue {
    Additive(f64),
    Multiplicative(f64),
    /// Combined with boolean-or by `apply_bool_or`, ignored by `apply`
    Flag(bool),
}

impl Default for ModifierValue {
    fn default() -> Self {
        Self::Additive(0.0)
    }
}

/// Who produced a modifier. The pipeline never reads this; it exists so
/// whole groups can be removed (e.g. every event modifier on collapse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Upgrade,
    Doctrine,
    Event,
    Automation,
    Adaptive,
    Momentum,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub value: ModifierValue,
    #[serde(default)]
    pub source: SourceTag,
}

impl Modifier {
    pub fn additive(magnitude: f64, source: SourceTag) -> Self {
        Self { value: ModifierValue::Additive(magnitude), source }
    }

    pub fn multiplicative(magnitude: f64, source: SourceTag) -> Self {
        Self { value: ModifierValue::Multiplicative(magnitude), source }
    }

    pub fn flag(on: bool, source: SourceTag) -> Self {
        Self { value: ModifierValue::Flag(on), source }
    }

    /// Build from loosely-typed data (content files, external tooling)
    ///
    /// Unknown kinds decode to `Additive(0.0)` so new content can be added
    /// without breaking older readers.
    pub fn from_parts(kind: &str, magnitude: f64, source: SourceTag) -> Self {
        let value = match kind {
            "additive" | "add" => ModifierValue::Additive(magnitude),
            "multiplicative" | "mult" | "multiply" => ModifierValue::Multiplicative(magnitude),
            "boolean_or" | "bool_or" | "flag" => ModifierValue::Flag(magnitude != 0.0),
            other => {
                tracing::warn!("Unknown modifier kind '{}', treating as additive 0", other);
                ModifierValue::default()
            }
        };
        Self { value, source }
    }
}

/// Data-file form of a modifier: `{ kind = "...", magnitude = ..., source = "..." }`
#[derive(Debug, Clone, Deserialize)]
pub struct RawModifier {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub magnitude: RawMagnitude,
    #[serde(default)]
    pub source: SourceTag,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMagnitude {
    Number(f64),
    Bool(bool),
}

impl Default for RawMagnitude {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl From<RawModifier> for Modifier {
    fn from(raw: RawModifier) -> Self {
        let magnitude = match raw.magnitude {
            RawMagnitude::Number(n) => n,
            RawMagnitude::Bool(true) => 1.0,
            RawMagnitude::Bool(false) => 0.0,
        };
        Modifier::from_parts(&raw.kind, magnitude, raw.source)
    }
}

/// Combine a base value with a list of modifiers
pub fn apply(base: f64, mods: &[Modifier]) -> f64 {
    let mut additive = 0.0;
    let mut multiplier = 1.0;

    for m in mods {
        match m.value {
            ModifierValue::Additive(v) => additive += v,
            ModifierValue::Multiplicative(v) => multiplier *= v,
            ModifierValue::Flag(_) => {}
        }
    }

    (base + additive) * multiplier
}

/// True if any flag modifier is set
pub fn apply_bool_or(mods: &[Modifier]) -> bool {
    mods.iter()
        .any(|m| matches!(m.value, ModifierValue::Flag(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(v: f64) -> Modifier {
        Modifier::additive(v, SourceTag::Other)
    }

    fn mult(v: f64) -> Modifier {
        Modifier::multiplicative(v, SourceTag::Other)
    }

    #[test]
    fn test_empty_list_returns_base() {
        assert_eq!(apply(7.5, &[]), 7.5);
        assert_eq!(apply(-3.0, &[]), -3.0);
    }

    #[test]
    fn test_additive_then_multiplicative() {
        assert_eq!(apply(10.0, &[add(5.0), mult(2.0)]), 30.0);
        // Order inside the list does not matter
        assert_eq!(apply(10.0, &[mult(2.0), add(5.0)]), 30.0);
    }

    #[test]
    fn test_zero_multiplier_zeroes_everything() {
        assert_eq!(apply(10.0, &[add(1000.0), mult(0.0), add(5.0)]), 0.0);
    }

    #[test]
    fn test_flags_do_not_affect_numeric_result() {
        let mods = [add(1.0), Modifier::flag(true, SourceTag::Event)];
        assert_eq!(apply(1.0, &mods), 2.0);
    }

    #[test]
    fn test_bool_or() {
        assert!(!apply_bool_or(&[]));
        assert!(!apply_bool_or(&[Modifier::flag(false, SourceTag::Event), add(3.0)]));
        assert!(apply_bool_or(&[
            Modifier::flag(false, SourceTag::Event),
            Modifier::flag(true, SourceTag::Automation),
        ]));
    }

    #[test]
    fn test_unknown_kind_becomes_additive_zero() {
        let m = Modifier::from_parts("exponential", 4.0, SourceTag::Event);
        assert_eq!(m.value, ModifierValue::Additive(0.0));
        assert_eq!(apply(2.0, &[m]), 2.0);
    }

    #[test]
    fn test_raw_modifier_decoding() {
        let raw: RawModifier =
            serde_json::from_str(r#"{"kind": "bool_or", "magnitude": true, "source": "event"}"#).unwrap();
        let m: Modifier = raw.into();
        assert_eq!(m.value, ModifierValue::Flag(true));
        assert_eq!(m.source, SourceTag::Event);

        let raw: RawModifier = serde_json::from_str(r#"{"kind": "mystery"}"#).unwrap();
        let m: Modifier = raw.into();
        assert_eq!(m.value, ModifierValue::Additive(0.0));
    }
}
