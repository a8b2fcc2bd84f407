use chrono::NaiveDateTime;

/// Record key layout: `MM/DD/YY HH:MM:SS`, no timezone.
pub const KEY_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// A record key that does not match [`KEY_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timestamp '{input}' does not match MM/DD/YY HH:MM:SS: {source}")]
pub struct TimestampError {
    pub input: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Parse a record key into a comparable instant.
pub fn parse_key(input: &str) -> Result<NaiveDateTime, TimestampError> {
    NaiveDateTime::parse_from_str(input, KEY_FORMAT).map_err(|source| TimestampError {
        input: input.to_string(),
        source,
    })
}

/// Render an instant back into record-key form.
pub fn format_key(instant: &NaiveDateTime) -> String {
    instant.format(KEY_FORMAT).to_string()
}

/// Current local wall-clock time as a record key.
pub fn now_key() -> String {
    format_key(&chrono::Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_key() {
        let t = parse_key("01/31/25 10:00:05").unwrap();
        assert_eq!(format_key(&t), "01/31/25 10:00:05");
        let earlier = parse_key("01/31/25 10:00:00").unwrap();
        assert_eq!((t - earlier).num_seconds(), 5);
    }

    #[test]
    fn day_boundary_is_ordered() {
        let a = parse_key("01/31/25 23:59:59").unwrap();
        let b = parse_key("02/01/25 00:00:01").unwrap();
        assert_eq!((b - a).num_seconds(), 2);
    }

    #[test]
    fn rejects_malformed_key() {
        let err = parse_key("not-a-date").unwrap_err();
        assert_eq!(err.input, "not-a-date");
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn now_key_round_trips() {
        let key = now_key();
        assert!(parse_key(&key).is_ok(), "{key}");
    }

    #[test]
    fn rejects_iso_layout() {
        assert!(parse_key("2025-01-31 10:00:00").is_err());
    }
}
