//! Built-in dimensional-analysis registry
//!
//! Read-only table of kitchen units, built once and shared. Scales are
//! relative to the reference unit of each dimensionality (cm, ml, g, second,
//! 1). US customary definitions are used for cups, pints and friends.

use super::Dimensionality::{Dimensionless, Length, Time, Volume, Weight};
use super::{DimensionalAnalysis, Dimensionality, Unit, UnitError};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

struct UnitDef {
    symbol: &'static str,
    dimensionality: Dimensionality,
    scale: f64,
    aliases: &'static [&'static str],
}

fn def(
    symbol: &'static str,
    dimensionality: Dimensionality,
    scale: f64,
    aliases: &'static [&'static str],
) -> UnitDef {
    UnitDef {
        symbol,
        dimensionality,
        scale,
        aliases,
    }
}

const TEASPOON_ML: f64 = 4.928_921_593_75;

fn unit_defs() -> Vec<UnitDef> {
    vec![
        // Length (cm)
        def("mm", Length, 0.1, &["millimeter", "millimetre"]),
        def("cm", Length, 1.0, &["centimeter", "centimetre"]),
        def("m", Length, 100.0, &["meter", "metre"]),
        def("km", Length, 100_000.0, &["kilometer", "kilometre"]),
        def("in", Length, 2.54, &["inch"]),
        def("ft", Length, 30.48, &["foot", "feet"]),
        def("yd", Length, 91.44, &["yard"]),
        // Volume (ml)
        def("ml", Volume, 1.0, &["milliliter", "millilitre", "cc"]),
        def("cl", Volume, 10.0, &["centiliter", "centilitre"]),
        def("dl", Volume, 100.0, &["deciliter", "decilitre"]),
        def("l", Volume, 1000.0, &["liter", "litre", "lt"]),
        def("tsp", Volume, TEASPOON_ML, &["teaspoon"]),
        def("tbsp", Volume, TEASPOON_ML * 3.0, &["tablespoon", "tbs", "tbl"]),
        def("floz", Volume, TEASPOON_ML * 6.0, &["fl oz", "fluid ounce"]),
        def("cup", Volume, TEASPOON_ML * 48.0, &["cp"]),
        def("pt", Volume, TEASPOON_ML * 96.0, &["pint"]),
        def("qt", Volume, TEASPOON_ML * 192.0, &["quart"]),
        def("gal", Volume, TEASPOON_ML * 768.0, &["gallon"]),
        def("pinch", Volume, TEASPOON_ML / 16.0, &[]),
        def("dash", Volume, TEASPOON_ML / 8.0, &[]),
        def("drop", Volume, 0.05, &[]),
        // Weight (g)
        def("mg", Weight, 0.001, &["milligram", "milligramme"]),
        def("g", Weight, 1.0, &["gm", "gram", "gramme"]),
        def("kg", Weight, 1000.0, &["kilogram", "kilogramme", "kilo"]),
        def("oz", Weight, 28.349_523_125, &["ounce"]),
        def("lb", Weight, 453.592_37, &["pound"]),
        // Time (s)
        def("s", Time, 1.0, &["sec", "second"]),
        def("min", Time, 60.0, &["minute"]),
        def("h", Time, 3600.0, &["hr", "hour"]),
        // Dimensionless
        def("dozen", Dimensionless, 12.0, &[]),
        def("percent", Dimensionless, 0.01, &["pct"]),
    ]
}

/// Table-backed `DimensionalAnalysis`
pub struct UnitRegistry {
    by_name: HashMap<&'static str, Unit>,
}

static SHARED: Lazy<Arc<UnitRegistry>> = Lazy::new(|| Arc::new(UnitRegistry::new()));

impl UnitRegistry {
    /// Build the registry from the built-in table
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        for def in unit_defs() {
            let unit = Unit {
                symbol: def.symbol,
                dimensionality: def.dimensionality,
                scale: def.scale,
            };
            by_name.insert(def.symbol, unit.clone());
            for alias in def.aliases {
                by_name.insert(*alias, unit.clone());
            }
        }
        Self { by_name }
    }

    /// Process-wide registry, built on first use
    pub fn shared() -> &'static UnitRegistry {
        SHARED.as_ref()
    }

    /// Owning handle to the process-wide registry
    pub fn shared_handle() -> Arc<UnitRegistry> {
        Arc::clone(&SHARED)
    }

    fn find(&self, name: &str) -> Option<&Unit> {
        if let Some(unit) = self.by_name.get(name) {
            return Some(unit);
        }
        // Plurals: "cups", "lbs", "inches", "pinches". Single-letter stems
        // are symbols ("m", "l", "g"), never pluralized: "ms" is not meters.
        [name.strip_suffix('s'), name.strip_suffix("es")]
            .into_iter()
            .flatten()
            .filter(|stem| stem.chars().count() > 1)
            .find_map(|stem| self.by_name.get(stem))
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical lookup key: lower-case words separated by single spaces
///
/// Periods are dropped (`"tbsp."`, `"fl. oz"`); `_` and `-` separate words.
fn canonical_name(text: &str) -> Result<String, UnitError> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let name = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if name.is_empty() || !name.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(UnitError::Malformed(text.to_string()));
    }
    Ok(name)
}

impl DimensionalAnalysis for UnitRegistry {
    fn lookup(&self, text: &str) -> Result<Option<Unit>, UnitError> {
        let name = canonical_name(text)?;
        Ok(self.find(&name).cloned())
    }

    fn convert(&self, magnitude: f64, from: &Unit, to: &Unit) -> Result<f64, UnitError> {
        if from.dimensionality != to.dimensionality {
            return Err(UnitError::Conversion(format!(
                "cannot convert {} ({}) to {} ({})",
                from.symbol, from.dimensionality, to.symbol, to.dimensionality
            )));
        }
        let converted = magnitude * from.scale / to.scale;
        if !converted.is_finite() {
            return Err(UnitError::Conversion(format!(
                "{magnitude} {} has no finite value in {}",
                from.symbol, to.symbol
            )));
        }
        Ok(converted)
    }
}
