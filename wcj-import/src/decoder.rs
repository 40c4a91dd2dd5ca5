//! Tolerant decoder
//!
//! Turns one raw feed record into a [`NormalizedRecord`]. Feeds are
//! inconsistent from record to record: ratings and distances arrive as text or
//! as numbers, GPS arrives as a `{Latitude, Longitude}` object, as free text,
//! or not at all. Every such union is resolved here, once; nothing past this
//! module sees the raw shapes.
//!
//! Partial data beats a dropped record. Unparseable rating text becomes a
//! warning plus an absent rating; a malformed GPS object becomes
//! [`Coordinates::Raw`] so it can be fixed by hand later. Only a record whose
//! shape cannot be trusted at all (no name, non-object, wrong JSON type for a
//! field) fails with a [`DecodeError`].

use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;
use wcj_common::db::GoalRatings;

use crate::error::DecodeError;
use crate::profile::FeedProfile;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Decoded GPS payload
///
/// Never partially populated: a latitude without a longitude is `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Coordinates {
    /// Both components present and numeric; usable for linking
    Valid(GeoPoint),
    /// Anything else, kept verbatim for manual correction
    Raw(String),
}

/// Non-fatal problem found while decoding a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    pub field: String,
    pub value: String,
    pub message: &'static str,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}: {}", self.field, self.value, self.message)
    }
}

/// One feed record after decoding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub beauty_rating: Option<i64>,
    pub photo_rating: Option<i64>,
    pub solitude_rating: Option<i64>,
    /// Kept as text; numeric inputs are rendered with two decimals
    pub distance: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub is_explicitly_new: bool,
    pub source_url: String,
    pub warnings: Vec<FieldWarning>,
}

impl NormalizedRecord {
    /// Coordinates usable for creating a location
    pub fn valid_point(&self) -> Option<GeoPoint> {
        match self.coordinates {
            Some(Coordinates::Valid(point)) => Some(point),
            _ => None,
        }
    }

    /// GPS text that could not be used, if any
    pub fn raw_coordinates(&self) -> Option<&str> {
        match &self.coordinates {
            Some(Coordinates::Raw(raw)) => Some(raw),
            _ => None,
        }
    }

    /// The columns an import writes onto a goal
    pub fn ratings(&self) -> GoalRatings {
        GoalRatings {
            rt_hike_distance: self.distance.clone(),
            beauty_rating: self.beauty_rating,
            photo_rating: self.photo_rating,
            solitude_rating: self.solitude_rating,
        }
    }
}

/// Field that feeds send either as text or as a number
#[derive(Debug, Clone, PartialEq)]
enum MixedValue {
    Text(String),
    Number(f64),
}

impl MixedValue {
    /// Read `key`; missing and `null` are absent
    fn read(record: &Map<String, Value>, key: &str) -> Result<Option<Self>, DecodeError> {
        match record.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(MixedValue::Text(s.clone()))),
            Some(Value::Number(n)) => Ok(n.as_f64().map(MixedValue::Number)),
            Some(other) => Err(DecodeError::UnsupportedType {
                key: key.to_string(),
                found: json_type(other),
            }),
        }
    }

    /// Canonical text form; empty text is absent
    fn into_text(self) -> Option<String> {
        match self {
            MixedValue::Text(s) => trimmed_text(&s),
            MixedValue::Number(n) => Some(format!("{:.2}", n)),
        }
    }
}

/// Decodes raw records using one feed's key names
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    profile: FeedProfile,
}

impl Decoder {
    pub fn new(profile: FeedProfile) -> Self {
        Self { profile }
    }

    /// Parse one element as read from the input, then [`Decoder::decode`] it
    ///
    /// Well-formed JSON that cannot be represented (numbers out of `f64`
    /// range) fails this record only.
    pub fn decode_raw(&self, raw: &RawValue) -> Result<NormalizedRecord, DecodeError> {
        let value: Value = serde_json::from_str(raw.get())
            .map_err(|e| DecodeError::Unrepresentable { message: e.to_string() })?;
        self.decode(&value)
    }

    pub fn decode(&self, raw: &Value) -> Result<NormalizedRecord, DecodeError> {
        let record = raw.as_object().ok_or(DecodeError::NotAnObject {
            found: json_type(raw),
        })?;
        let p = &self.profile;

        let name = match record.get(&p.name) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => return Err(DecodeError::MissingName { key: p.name.clone() }),
        };

        let mut warnings = Vec::new();
        let beauty_rating = decode_rating(record, &p.beauty_rating, &mut warnings)?;
        let photo_rating = decode_rating(record, &p.photo_rating, &mut warnings)?;
        let solitude_rating = decode_rating(record, &p.solitude_rating, &mut warnings)?;
        let distance = MixedValue::read(record, &p.distance)?.and_then(MixedValue::into_text);
        let coordinates = decode_coordinates(record.get(&p.coordinates), p);
        let is_explicitly_new = decode_flag(record, &p.is_new)?;
        let source_url = decode_text(record, &p.source_url)?;

        for warning in &warnings {
            warn!(name = %name, "Ignoring unparseable field: {}", warning);
        }

        Ok(NormalizedRecord {
            name,
            beauty_rating,
            photo_rating,
            solitude_rating,
            distance,
            coordinates,
            is_explicitly_new,
            source_url,
            warnings,
        })
    }
}

fn decode_rating(
    record: &Map<String, Value>,
    key: &str,
    warnings: &mut Vec<FieldWarning>,
) -> Result<Option<i64>, DecodeError> {
    let text = MixedValue::read(record, key)?.and_then(MixedValue::into_text);
    Ok(integer_field(key, text, "not an integer rating", warnings))
}

/// Integer from optional field text; unparseable text becomes a warning
pub(crate) fn integer_field(
    field: &str,
    text: Option<String>,
    message: &'static str,
    warnings: &mut Vec<FieldWarning>,
) -> Option<i64> {
    let text = text?;
    match parse_integer(&text) {
        Some(value) => Some(value),
        None => {
            warnings.push(FieldWarning {
                field: field.to_string(),
                value: text,
                message,
            });
            None
        }
    }
}

/// Integer from text; integral decimals like "4.00" are accepted
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(v as i64),
        _ => None,
    }
}

/// Trimmed text; empty or whitespace-only is absent
pub(crate) fn trimmed_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn decode_coordinates(value: Option<&Value>, profile: &FeedProfile) -> Option<Coordinates> {
    match value? {
        Value::Null => None,
        Value::Object(gps) => {
            let latitude = gps.get(&profile.latitude).and_then(Value::as_f64);
            let longitude = gps.get(&profile.longitude).and_then(Value::as_f64);
            match (latitude, longitude) {
                (Some(latitude), Some(longitude)) => {
                    Some(Coordinates::Valid(GeoPoint { latitude, longitude }))
                }
                _ => Some(Coordinates::Raw(Value::Object(gps.clone()).to_string())),
            }
        }
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(Coordinates::Raw(s.clone())),
        other => Some(Coordinates::Raw(other.to_string())),
    }
}

fn decode_flag(record: &Map<String, Value>, key: &str) -> Result<bool, DecodeError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(DecodeError::UnsupportedType {
            key: key.to_string(),
            found: json_type(other),
        }),
    }
}

fn decode_text(record: &Map<String, Value>, key: &str) -> Result<String, DecodeError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DecodeError::UnsupportedType {
            key: key.to_string(),
            found: json_type(other),
        }),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FeedKind;
    use serde_json::json;

    fn decode(raw: Value) -> Result<NormalizedRecord, DecodeError> {
        Decoder::default().decode(&raw)
    }

    #[test]
    fn test_full_record_decodes() {
        let record = decode(json!({
            "Name": "Looking Glass Falls",
            "Beauty": "4",
            "Photo Rating": "5",
            "Solitude": "1",
            "GPS": { "Latitude": 35.2966, "Longitude": -82.7697 },
            "Distance": "0.1",
            "Height": "60 ft",
            "url": "https://example.org/looking-glass",
            "new_fall": true
        }))
        .unwrap();

        assert_eq!(record.name, "Looking Glass Falls");
        assert_eq!(record.beauty_rating, Some(4));
        assert_eq!(record.photo_rating, Some(5));
        assert_eq!(record.solitude_rating, Some(1));
        assert_eq!(record.distance.as_deref(), Some("0.1"));
        assert_eq!(
            record.valid_point(),
            Some(GeoPoint { latitude: 35.2966, longitude: -82.7697 })
        );
        assert!(record.is_explicitly_new);
        assert_eq!(record.source_url, "https://example.org/looking-glass");
        assert!(record.warnings.is_empty());
    }

    #[test]
    fn test_coordinates_valid_pair() {
        let record =
            decode(json!({ "Name": "A", "GPS": { "Latitude": 35.1, "Longitude": -82.3 } }))
                .unwrap();
        assert_eq!(
            record.coordinates,
            Some(Coordinates::Valid(GeoPoint { latitude: 35.1, longitude: -82.3 }))
        );
    }

    #[test]
    fn test_coordinates_missing_longitude_is_raw() {
        let record = decode(json!({ "Name": "A", "GPS": { "Latitude": 35.1 } })).unwrap();
        assert_eq!(record.coordinates, Some(Coordinates::Raw("{\"Latitude\":35.1}".to_string())));
        assert_eq!(record.valid_point(), None);
    }

    #[test]
    fn test_coordinates_non_numeric_component_is_raw() {
        let record =
            decode(json!({ "Name": "A", "GPS": { "Latitude": "35.1", "Longitude": -82.3 } }))
                .unwrap();
        assert!(matches!(record.coordinates, Some(Coordinates::Raw(_))));
    }

    #[test]
    fn test_coordinates_text_is_raw() {
        let record = decode(json!({ "Name": "A", "GPS": "unknown" })).unwrap();
        assert_eq!(record.coordinates, Some(Coordinates::Raw("unknown".to_string())));
        assert_eq!(record.raw_coordinates(), Some("unknown"));
    }

    #[test]
    fn test_coordinates_absent_null_or_empty() {
        assert_eq!(decode(json!({ "Name": "A" })).unwrap().coordinates, None);
        assert_eq!(decode(json!({ "Name": "A", "GPS": null })).unwrap().coordinates, None);
        assert_eq!(decode(json!({ "Name": "A", "GPS": "" })).unwrap().coordinates, None);
    }

    #[test]
    fn test_rating_text_decodes_to_integer() {
        let record = decode(json!({ "Name": "A", "Beauty": "4" })).unwrap();
        assert_eq!(record.beauty_rating, Some(4));
    }

    #[test]
    fn test_rating_empty_string_is_absent_without_warning() {
        let record = decode(json!({ "Name": "A", "Beauty": "" })).unwrap();
        assert_eq!(record.beauty_rating, None);
        assert!(record.warnings.is_empty());
    }

    #[test]
    fn test_rating_unparseable_is_absent_with_warning() {
        let record = decode(json!({ "Name": "A", "Beauty": "four", "Solitude": "3" })).unwrap();
        assert_eq!(record.beauty_rating, None);
        assert_eq!(record.solitude_rating, Some(3));
        assert_eq!(
            record.warnings,
            vec![FieldWarning {
                field: "Beauty".to_string(),
                value: "four".to_string(),
                message: "not an integer rating",
            }]
        );
    }

    #[test]
    fn test_rating_numeric_inputs() {
        let record =
            decode(json!({ "Name": "A", "Beauty": 4, "Photo Rating": 3.0, "Solitude": 2.5 }))
                .unwrap();
        assert_eq!(record.beauty_rating, Some(4));
        assert_eq!(record.photo_rating, Some(3));
        assert_eq!(record.solitude_rating, None);
        assert_eq!(record.warnings.len(), 1);
        assert_eq!(record.warnings[0].value, "2.50");
    }

    #[test]
    fn test_distance_number_uses_two_decimals() {
        let record = decode(json!({ "Name": "A", "Distance": 1.5 })).unwrap();
        assert_eq!(record.distance.as_deref(), Some("1.50"));

        let record = decode(json!({ "Name": "A", "Distance": 2 })).unwrap();
        assert_eq!(record.distance.as_deref(), Some("2.00"));
    }

    #[test]
    fn test_distance_text_kept_verbatim() {
        let record = decode(json!({ "Name": "A", "Distance": "1.2 miles RT" })).unwrap();
        assert_eq!(record.distance.as_deref(), Some("1.2 miles RT"));

        let record = decode(json!({ "Name": "A", "Distance": "  " })).unwrap();
        assert_eq!(record.distance, None);
    }

    #[test]
    fn test_distance_wrong_type_fails_record() {
        let err = decode(json!({ "Name": "A", "Distance": [1, 2] })).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedType { key: "Distance".to_string(), found: "array" }
        );
    }

    #[test]
    fn test_missing_or_empty_name_fails() {
        assert!(matches!(decode(json!({ "Beauty": "3" })), Err(DecodeError::MissingName { .. })));
        assert!(matches!(decode(json!({ "Name": "   " })), Err(DecodeError::MissingName { .. })));
        assert!(matches!(decode(json!({ "Name": 12 })), Err(DecodeError::MissingName { .. })));
    }

    #[test]
    fn test_non_object_record_fails() {
        assert_eq!(
            decode(json!(["Name", "A"])).unwrap_err(),
            DecodeError::NotAnObject { found: "array" }
        );
    }

    #[test]
    fn test_new_flag_defaults_false_and_rejects_text() {
        assert!(!decode(json!({ "Name": "A" })).unwrap().is_explicitly_new);
        assert!(!decode(json!({ "Name": "A", "new_fall": null })).unwrap().is_explicitly_new);
        assert!(matches!(
            decode(json!({ "Name": "A", "new_fall": "yes" })),
            Err(DecodeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_curated_profile_keys() {
        let decoder = Decoder::new(FeedKind::Curated.profile());
        let record = decoder
            .decode(&json!({
                "name": "Whitewater Falls",
                "beauty_rating": 5,
                "distance": "0.5",
                "coordinates": { "latitude": 35.03, "longitude": -83.01 },
                "is_new": true,
                "source_url": "https://example.org/whitewater"
            }))
            .unwrap();

        assert_eq!(record.name, "Whitewater Falls");
        assert_eq!(record.beauty_rating, Some(5));
        assert!(record.valid_point().is_some());
        assert!(record.is_explicitly_new);
    }

    #[test]
    fn test_out_of_range_number_fails_record() {
        let raw = RawValue::from_string(r#"{"Name": "Huge Falls", "Distance": 1e400}"#.to_string())
            .unwrap();
        let err = Decoder::default().decode_raw(&raw).unwrap_err();
        assert!(matches!(err, DecodeError::Unrepresentable { .. }));
        assert!(err.to_string().contains("number out of range"));
    }

    #[test]
    fn test_raw_record_decodes() {
        let raw = RawValue::from_string(r#"{"Name": "Fine Falls", "Beauty": "3"}"#.to_string())
            .unwrap();
        let record = Decoder::default().decode_raw(&raw).unwrap();
        assert_eq!(record.name, "Fine Falls");
        assert_eq!(record.beauty_rating, Some(3));
    }

    #[test]
    fn test_integer_field_warns_with_custom_message() {
        let mut warnings = Vec::new();
        let page = |text: &str, warnings: &mut Vec<FieldWarning>| {
            integer_field("Page", Some(text.to_string()), "not an integer", warnings)
        };
        assert_eq!(page("12", &mut warnings), Some(12));
        assert_eq!(page("xii", &mut warnings), None);
        assert_eq!(integer_field("Page", None, "not an integer", &mut warnings), None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "not an integer");
    }

    #[test]
    fn test_ratings_projection() {
        let record = decode(json!({ "Name": "A", "Beauty": "2", "Distance": 3 })).unwrap();
        assert_eq!(
            record.ratings(),
            GoalRatings {
                rt_hike_distance: Some("3.00".to_string()),
                beauty_rating: Some(2),
                photo_rating: None,
                solitude_rating: None,
            }
        );
    }
}
