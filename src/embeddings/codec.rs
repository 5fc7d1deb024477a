//! Text form of embedding vectors.
//!
//! Vectors are stored on documents and chunks as JSON arrays of numbers. A
//! stored value that does not decode to a non-empty array of finite numbers is
//! treated as "not embedded" instead of an error.

/// Encode a vector as a JSON array.
pub fn serialize(vector: &[f32]) -> String {
    // Encoding a float slice only fails for writers that error; a String never does.
    serde_json::to_string(vector).unwrap_or_else(|_| String::from("[]"))
}

/// Decode a stored vector. Absent or malformed input yields `None`.
pub fn parse(raw: Option<&str>) -> Option<Vec<f32>> {
    let vector: Vec<f32> = serde_json::from_str(raw?).ok()?;

    if vector.is_empty() || vector.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(vector)
}
