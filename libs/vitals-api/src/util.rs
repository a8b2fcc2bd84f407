use serde::{Deserialize, Deserializer};

/// Accept a JSON number or a numeric string as `f64`.
///
/// Managed key-value stores hand back decimals as strings; both forms
/// decode to the same value. Non-finite results are rejected.
pub fn de_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("'{s}' is not a number: {e}")))?,
    };
    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!("{value} is not a finite number")));
    }
    Ok(value)
}
