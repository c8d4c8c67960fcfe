//! Controlled vocabularies offered by the storefront's product forms.
//!
//! These are reference data for presentation. Validation does not restrict
//! product fields to them, so merchants can use their own tags.

use serde::Serialize;

/// A product category with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub value: &'static str,
    pub label: &'static str,
}

/// A named color and its hex code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub name: &'static str,
    pub hex: &'static str,
}

pub const DEFAULT_CATEGORY: &str = "tactical";

pub const CATEGORIES: &[Category] = &[
    Category { value: "tactical", label: "Equipamiento Táctico" },
    Category { value: "uniform", label: "Uniformes" },
    Category { value: "accessories", label: "Accesorios" },
    Category { value: "protection", label: "Protección" },
    Category { value: "camping", label: "Camping" },
];

pub const SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "XXXL", "36", "38", "40", "42", "44", "46", "48",
];

pub const COLORS: &[Color] = &[
    Color { name: "Negro", hex: "#000000" },
    Color { name: "Verde Militar", hex: "#4b5320" },
    Color { name: "Camo", hex: "#53593f" },
    Color { name: "Khaki", hex: "#bfb878" },
    Color { name: "Marrón Táctico", hex: "#594d3c" },
    Color { name: "Tan", hex: "#d2b48c" },
    Color { name: "Gris", hex: "#808080" },
    Color { name: "Azul Marino", hex: "#000080" },
];

pub const MATERIALS: &[&str] = &[
    "Nylon", "Poliéster", "Algodón", "Cordura", "Ripstop", "Cuero", "Kevlar", "Metal", "Plástico",
    "Gore-Tex",
];

pub fn category_label(value: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.label)
}

pub fn color_hex(name: &str) -> Option<&'static str> {
    COLORS.iter().find(|c| c.name == name).map(|c| c.hex)
}

/// Letter sizes (`XS`..`XXXL`), as opposed to numeric shoe/trouser sizes.
pub fn letter_sizes() -> impl Iterator<Item = &'static str> {
    SIZES
        .iter()
        .copied()
        .filter(|s| !s.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category_is_listed() {
        assert_eq!(category_label(DEFAULT_CATEGORY), Some("Equipamiento Táctico"));
        assert_eq!(category_label("drones"), None);
    }

    #[test]
    fn test_color_lookup() {
        assert_eq!(color_hex("Verde Militar"), Some("#4b5320"));
        assert_eq!(color_hex("Fucsia"), None);
    }

    #[test]
    fn test_letter_sizes() {
        let sizes: Vec<&str> = letter_sizes().collect();
        assert_eq!(sizes, vec!["XS", "S", "M", "L", "XL", "XXL", "XXXL"]);
    }
}
