//! Unit Normalizer
//!
//! Converts a (quantity, unit) pair to the base unit of its dimensionality:
//!
//! | Dimensionality | Base unit |
//! |----------------|-----------|
//! | length         | `cm`      |
//! | volume         | `ml`      |
//! | weight         | `g`       |
//!
//! Failures come in two severities. A unit whose dimensionality has no base
//! unit (including well-formed names the registry does not know) is a hard
//! failure that callers must surface. Everything else (missing magnitude,
//! missing or malformed unit text, failed conversion) is soft.

pub mod registry;

pub use registry::UnitRegistry;

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Physical category of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensionality {
    Length,
    Volume,
    Weight,
    Time,
    Dimensionless,
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "length"),
            Self::Volume => write!(f, "volume"),
            Self::Weight => write!(f, "weight"),
            Self::Time => write!(f, "time"),
            Self::Dimensionless => write!(f, "dimensionless"),
        }
    }
}

/// Reference quantities defining each normalizable dimensionality
pub const BASE_UNITS: [(Dimensionality, &str); 3] = [
    (Dimensionality::Length, "cm"),
    (Dimensionality::Volume, "ml"),
    (Dimensionality::Weight, "g"),
];

/// A resolved unit
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Canonical symbol (e.g. `"ml"` for "milliliters")
    pub symbol: &'static str,
    pub dimensionality: Dimensionality,
    /// Size relative to the dimensionality's reference unit
    pub scale: f64,
}

/// Unit parsing, classification and conversion service
pub trait DimensionalAnalysis: Send + Sync {
    /// Resolve a unit name
    ///
    /// `Err(UnitError::Malformed)` if the text cannot name a unit at all,
    /// `Ok(None)` if it is well-formed but unknown.
    fn lookup(&self, text: &str) -> Result<Option<Unit>, UnitError>;

    /// Convert a magnitude between units of the same dimensionality
    fn convert(&self, magnitude: f64, from: &Unit, to: &Unit) -> Result<f64, UnitError>;

    /// Canonical symbol of a unit
    fn symbol(&self, unit: &Unit) -> String {
        unit.symbol.to_string()
    }
}

/// Unit normalization failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// No magnitude to convert
    #[error("missing quantity")]
    MissingQuantity,

    /// No unit to convert from
    #[error("missing units")]
    MissingUnits,

    /// Text cannot be parsed as a unit name
    #[error("malformed unit '{0}'")]
    Malformed(String),

    /// Dimensionality has no base unit (hard failure)
    #[error("could not find base units for quantity {quantity} {units}{}", describe_dimensionality(.dimensionality))]
    NoBaseUnit {
        quantity: f64,
        units: String,
        dimensionality: Option<Dimensionality>,
    },

    /// Conversion produced no usable magnitude
    #[error("conversion failed: {0}")]
    Conversion(String),
}

fn describe_dimensionality(dimensionality: &Option<Dimensionality>) -> String {
    match dimensionality {
        Some(d) => format!(" ({d})"),
        None => " (unknown unit)".to_string(),
    }
}

impl UnitError {
    /// True for the failure that must propagate to the caller
    pub fn is_hard(&self) -> bool {
        matches!(self, UnitError::NoBaseUnit { .. })
    }
}

/// Base-unit quantity with provenance
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUnits {
    pub quantity: f64,
    pub units: String,
    pub quantity_parser: String,
    pub units_parser: String,
}

/// Source of the pair to normalize, with provenance per half
#[derive(Debug, Clone, Copy)]
pub struct MeasureSource<'a> {
    pub quantity: Option<f64>,
    pub quantity_parser: &'a str,
    pub units: Option<&'a str>,
    pub units_parser: &'a str,
}

/// Normalizes measures to base units, tagging provenance with `tag`
pub struct UnitNormalizer<'a> {
    analysis: &'a dyn DimensionalAnalysis,
    tag: &'a str,
}

impl<'a> UnitNormalizer<'a> {
    pub fn new(analysis: &'a dyn DimensionalAnalysis, tag: &'a str) -> Self {
        Self { analysis, tag }
    }

    /// Base unit for a dimensionality, if it has one
    pub fn base_unit(&self, dimensionality: Dimensionality) -> Result<Option<Unit>, UnitError> {
        for (base_dimensionality, symbol) in BASE_UNITS {
            if base_dimensionality != dimensionality {
                continue;
            }
            let unit = self.analysis.lookup(symbol)?.ok_or_else(|| {
                UnitError::Conversion(format!("base unit '{symbol}' is not defined"))
            })?;
            return Ok(Some(unit));
        }
        Ok(None)
    }

    /// Convert a measure to its base unit
    pub fn normalize(&self, source: MeasureSource<'_>) -> Result<NormalizedUnits, UnitError> {
        let quantity = source.quantity.ok_or(UnitError::MissingQuantity)?;
        let units = source
            .units
            .filter(|u| !u.trim().is_empty())
            .ok_or(UnitError::MissingUnits)?;

        let unit = self.analysis.lookup(units)?;
        let base = match &unit {
            Some(unit) => self.base_unit(unit.dimensionality)?,
            None => None,
        };
        let (unit, base) = match (unit, base) {
            (Some(unit), Some(base)) => (unit, base),
            (unit, _) => {
                return Err(UnitError::NoBaseUnit {
                    quantity,
                    units: units.to_string(),
                    dimensionality: unit.map(|u| u.dimensionality),
                })
            }
        };

        let magnitude = self.analysis.convert(quantity, &unit, &base)?;
        trace!(quantity, units, magnitude, base = base.symbol, "Converted to base unit");

        Ok(NormalizedUnits {
            quantity: magnitude,
            units: self.analysis.symbol(&base),
            quantity_parser: format!("{}+{}", source.quantity_parser, self.tag),
            units_parser: format!("{}+{}", source.units_parser, self.tag),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure<'a>(quantity: Option<f64>, units: Option<&'a str>) -> MeasureSource<'a> {
        MeasureSource {
            quantity,
            quantity_parser: "statistical",
            units,
            units_parser: "statistical",
        }
    }

    fn normalizer() -> UnitNormalizer<'static> {
        UnitNormalizer::new(UnitRegistry::shared(), "normalizer")
    }

    #[test]
    fn test_base_unit_is_idempotent() {
        let result = normalizer().normalize(measure(Some(100.0), Some("g"))).unwrap();
        assert_eq!(result.quantity, 100.0);
        assert_eq!(result.units, "g");
        assert_eq!(result.quantity_parser, "statistical+normalizer");
        assert_eq!(result.units_parser, "statistical+normalizer");
    }

    #[test]
    fn test_each_dimensionality_maps_to_its_base() {
        let n = normalizer();

        let volume = n.normalize(measure(Some(1.5), Some("cup"))).unwrap();
        assert_eq!(volume.units, "ml");
        assert!((volume.quantity - 354.882_354_75).abs() < 1e-9);

        let weight = n.normalize(measure(Some(2.0), Some("pounds"))).unwrap();
        assert_eq!(weight.units, "g");
        assert!((weight.quantity - 907.184_74).abs() < 1e-9);

        let length = n.normalize(measure(Some(2.0), Some("inches"))).unwrap();
        assert_eq!(length.units, "cm");
        assert!((length.quantity - 5.08).abs() < 1e-12);
    }

    #[test]
    fn test_provenance_per_half() {
        let source = MeasureSource {
            quantity: Some(1.0),
            quantity_parser: "statistical",
            units: Some("tbsp"),
            units_parser: "grammar",
        };
        let result = UnitNormalizer::new(UnitRegistry::shared(), "pint")
            .normalize(source)
            .unwrap();
        assert_eq!(result.quantity_parser, "statistical+pint");
        assert_eq!(result.units_parser, "grammar+pint");
    }

    #[test]
    fn test_unknown_unit_is_hard_failure() {
        let err = normalizer().normalize(measure(Some(2.0), Some("whole"))).unwrap_err();
        assert!(err.is_hard());
        assert_eq!(
            err,
            UnitError::NoBaseUnit {
                quantity: 2.0,
                units: "whole".to_string(),
                dimensionality: None
            }
        );

        // Single-letter symbols are not pluralized ("ms" is not meters)
        let err = normalizer().normalize(measure(Some(2.0), Some("ms"))).unwrap_err();
        assert!(err.is_hard());
    }

    #[test]
    fn test_other_dimensionality_is_hard_failure() {
        let err = normalizer().normalize(measure(Some(5.0), Some("minutes"))).unwrap_err();
        assert!(err.is_hard());
        assert!(err.to_string().contains("(time)"));

        let err = normalizer().normalize(measure(Some(1.0), Some("dozen"))).unwrap_err();
        assert!(err.is_hard());
    }

    #[test]
    fn test_soft_failures() {
        let n = normalizer();
        assert_eq!(
            n.normalize(measure(None, Some("cup"))).unwrap_err(),
            UnitError::MissingQuantity
        );
        assert_eq!(
            n.normalize(measure(Some(1.0), None)).unwrap_err(),
            UnitError::MissingUnits
        );
        assert_eq!(
            n.normalize(measure(Some(1.0), Some("  "))).unwrap_err(),
            UnitError::MissingUnits
        );
        let malformed = n.normalize(measure(Some(1.0), Some("1/2 cup"))).unwrap_err();
        assert!(matches!(malformed, UnitError::Malformed(_)));
        assert!(!malformed.is_hard());
    }

    #[test]
    fn test_non_finite_magnitude_is_soft() {
        let err = normalizer()
            .normalize(measure(Some(f64::INFINITY), Some("cup")))
            .unwrap_err();
        assert!(matches!(err, UnitError::Conversion(_)));
    }
}
