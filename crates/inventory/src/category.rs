use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Product category.
///
/// The four known categories drive handling and planning rules; anything else
/// is carried through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProductCategory {
    Tiles,
    ConstructionMaterials,
    RoofingMaterials,
    PlumbingSupplies,
    Other(String),
}

impl ProductCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ProductCategory::Tiles => "TILES",
            ProductCategory::ConstructionMaterials => "CONSTRUCTION_MATERIALS",
            ProductCategory::RoofingMaterials => "ROOFING_MATERIALS",
            ProductCategory::PlumbingSupplies => "PLUMBING_SUPPLIES",
            ProductCategory::Other(raw) => raw,
        }
    }

    /// Tiles break; everything else ships without protective packaging.
    pub fn is_fragile(&self) -> bool {
        matches!(self, ProductCategory::Tiles)
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Ok(match normalized.as_str() {
            "TILES" => ProductCategory::Tiles,
            "CONSTRUCTION_MATERIALS" => ProductCategory::ConstructionMaterials,
            "ROOFING_MATERIALS" => ProductCategory::RoofingMaterials,
            "PLUMBING_SUPPLIES" => ProductCategory::PlumbingSupplies,
            _ => ProductCategory::Other(s.trim().to_string()),
        })
    }
}

impl TryFrom<String> for ProductCategory {
    type Error = core::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductCategory> for String {
    fn from(value: ProductCategory) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_categories_case_insensitively() {
        assert_eq!("tiles".parse::<ProductCategory>().unwrap(), ProductCategory::Tiles);
        assert_eq!(
            "Plumbing Supplies".parse::<ProductCategory>().unwrap(),
            ProductCategory::PlumbingSupplies
        );
    }

    #[test]
    fn unknown_categories_are_preserved() {
        let c: ProductCategory = "GARDEN".parse().unwrap();
        assert_eq!(c, ProductCategory::Other("GARDEN".into()));
        assert_eq!(c.to_string(), "GARDEN");
        assert!(!c.is_fragile());
    }

    #[test]
    fn string_form_round_trips() {
        let raw = String::from(ProductCategory::RoofingMaterials);
        assert_eq!(raw, "ROOFING_MATERIALS");
        assert_eq!(
            ProductCategory::try_from(raw).unwrap(),
            ProductCategory::RoofingMaterials
        );
    }
}
