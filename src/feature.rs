//! Evaluation inputs: globals and features

use std::fmt;

use crate::value::{Properties, Value};

/// Values that are the same for every feature in one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Globals {
    pub zoom: Option<f64>,
}
impl Globals {
    pub fn zoom(zoom: f64) -> Self {
        Self { zoom: Some(zoom) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    Unknown,
    Point,
    LineString,
    Polygon,
}
impl GeometryType {
    const BY_CODE: [GeometryType; 4] = [
        GeometryType::Unknown,
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
    ];

    /// Map a vector tile geometry type code. Unknown codes map to `Unknown`.
    pub fn from_code(code: u32) -> Self {
        Self::BY_CODE
            .get(code as usize)
            .copied()
            .unwrap_or(GeometryType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}
impl Default for GeometryType {
    fn default() -> Self {
        Self::Unknown
    }
}
impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The feature being filtered or styled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub properties: Properties,
    pub id: Option<Value>,
    pub geometry_type: GeometryType,
}
impl Feature {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    /// Build the feature view of a decoded vector tile feature: missing
    /// properties become an empty map, and the geometry type code is
    /// mapped through `GeometryType::from_code`.
    pub fn from_vector_tile(properties: Option<Properties>, id: Option<Value>, code: u32) -> Self {
        Self {
            properties: properties.unwrap_or_default(),
            id,
            geometry_type: GeometryType::from_code(code),
        }
    }

    pub fn with_id<V: Into<Value>>(mut self, id: V) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = geometry_type;
        self
    }

    /// Build a feature from a JSON object of properties. Anything other than
    /// an object yields no properties.
    pub fn from_json(properties: &serde_json::Value) -> Self {
        match Value::from(properties) {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }
}
