//! Spatial predicate evaluation.

use std::fmt;
use std::str::FromStr;

use geo::{Contains, Intersects};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Spatial relationship between two geometries.
///
/// Evaluated exactly via the geo crate. `eval(a, b)` reads as
/// "a *predicate* b": `Contains` is "a contains b", `Within` is
/// "a within b"; `Intersects` is symmetric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialPredicate {
    #[default]
    Intersects,
    Contains,
    Within,
}

impl SpatialPredicate {
    /// Evaluate "a *predicate* b".
    pub fn eval(&self, a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
        match self {
            SpatialPredicate::Intersects => a.intersects(b),
            SpatialPredicate::Contains => a.contains(b),
            SpatialPredicate::Within => b.contains(a),
        }
    }
}

impl fmt::Display for SpatialPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpatialPredicate::Intersects => "intersects",
            SpatialPredicate::Contains => "contains",
            SpatialPredicate::Within => "within",
        };
        f.write_str(s)
    }
}

impl FromStr for SpatialPredicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intersects" => Ok(SpatialPredicate::Intersects),
            "contains" => Ok(SpatialPredicate::Contains),
            "within" => Ok(SpatialPredicate::Within),
            other => Err(format!(
                "unknown spatial predicate '{other}' (expected intersects, contains or within)"
            )),
        }
    }
}
