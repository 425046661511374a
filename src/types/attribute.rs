//! Semantic attribute keys
//!
//! Upstream detections tag each shape with a shape category and a color
//! category; together those form the attribute key that names one tracked
//! entity, e.g. `buoy/red`. Keys are parsed once at configuration-load time
//! into typed values rather than re-derived from raw strings per message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape category reported by the shape classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shape {
    Buoy,
    Gate,
    Pipe,
    Bin,
    Torpedo,
    /// A category this build does not know by name. Preserved verbatim so a
    /// newer classifier vocabulary still round-trips through association.
    Other(String),
}

/// Color category reported by the color classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Orange,
    Blue,
    Black,
    /// An unrecognized color label, preserved verbatim.
    Other(String),
}

impl Shape {
    /// Wire string for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Shape::Buoy => "buoy",
            Shape::Gate => "gate",
            Shape::Pipe => "pipe",
            Shape::Bin => "bin",
            Shape::Torpedo => "torpedo",
            Shape::Other(s) => s,
        }
    }
}

impl Color {
    /// Wire string for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Blue => "blue",
            Color::Black => "black",
            Color::Other(s) => s,
        }
    }
}

impl From<&str> for Shape {
    fn from(s: &str) -> Self {
        match s {
            "buoy" => Shape::Buoy,
            "gate" => Shape::Gate,
            "pipe" => Shape::Pipe,
            "bin" => Shape::Bin,
            "torpedo" => Shape::Torpedo,
            other => Shape::Other(other.to_string()),
        }
    }
}

impl From<String> for Shape {
    fn from(s: String) -> Self {
        Shape::from(s.as_str())
    }
}

impl From<Shape> for String {
    fn from(s: Shape) -> Self {
        s.as_str().to_string()
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        match s {
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "orange" => Color::Orange,
            "blue" => Color::Blue,
            "black" => Color::Black,
            other => Color::Other(other.to_string()),
        }
    }
}

impl From<String> for Color {
    fn from(s: String) -> Self {
        Color::from(s.as_str())
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape/color pair uniquely identifying one tracked entity.
///
/// Displays as `"<shape>/<color>"`, matching the wire convention of the
/// upstream detection stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeKey {
    pub shape: Shape,
    pub color: Color,
}

impl AttributeKey {
    /// Create a key from typed categories.
    pub fn new(shape: Shape, color: Color) -> Self {
        Self { shape, color }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shape, self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_round_trip() {
        assert_eq!(Shape::from("buoy"), Shape::Buoy);
        assert_eq!(Shape::Buoy.as_str(), "buoy");
        assert_eq!(Color::from("red"), Color::Red);
        assert_eq!(Color::Red.to_string(), "red");
    }

    #[test]
    fn test_unknown_categories_are_preserved() {
        let shape = Shape::from("hydrophone");
        assert_eq!(shape, Shape::Other("hydrophone".to_string()));
        assert_eq!(shape.as_str(), "hydrophone");
    }

    #[test]
    fn test_key_display_matches_wire_convention() {
        let key = AttributeKey::new(Shape::Buoy, Color::Red);
        assert_eq!(key.to_string(), "buoy/red");
    }

    #[test]
    fn test_keys_with_equal_categories_hash_equal() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(AttributeKey::new(Shape::Gate, Color::Green), 1);

        let probe = AttributeKey::new(Shape::from("gate"), Color::from("green"));
        assert_eq!(map.get(&probe), Some(&1));
    }
}
