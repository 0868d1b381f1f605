use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub type ConnectionId = u64;
pub type DiagramId = i64;

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Point of a freehand stroke.
///
/// Deserialization never fails: a missing or non-numeric coordinate is read as `0`, and anything
/// that is not an object at all becomes the origin. Whole coordinates serialize as JSON integers.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Point {
    #[serde(serialize_with = "serialize_coordinate")]
    pub x: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub y: f64,
}

fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&Value> for Point {
    fn from(value: &Value) -> Self {
        let coordinate = |key: &str| value.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Self {
            x: coordinate("x"),
            y: coordinate("y"),
        }
    }
}

impl From<Value> for Point {
    fn from(value: Value) -> Self {
        Point::from(&value)
    }
}

/// One continuous pen movement. Point order is drawing order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl From<&Value> for Stroke {
    fn from(value: &Value) -> Self {
        let points = value
            .get("points")
            .and_then(Value::as_array)
            .map(|points| points.iter().map(Point::from).collect())
            .unwrap_or_default();
        Self { points }
    }
}

impl From<Value> for Stroke {
    fn from(value: Value) -> Self {
        Stroke::from(&value)
    }
}
