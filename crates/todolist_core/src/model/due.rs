use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Parses a due date given either as RFC 3339 or as a local
/// `YYYY-MM-DDTHH:MM[:SS]` value (a space may replace the `T`).
///
/// Local values carry no offset, so they are pinned to `local_offset`.
pub fn parse_due_date(raw: &str, local_offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("due date is empty"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let normalized = trimmed.replacen(' ', "T", 1);
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");

    PrimitiveDateTime::parse(&normalized, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(&normalized, without_seconds))
        .map(|local| local.assume_offset(local_offset))
        .map_err(|_| {
            AppError::invalid_input(format!(
                "due date '{trimmed}' must be RFC3339 or YYYY-MM-DDTHH:MM"
            ))
        })
}

pub fn normalize_due_date(raw: &str, local_offset: UtcOffset) -> Result<String, AppError> {
    parse_due_date(raw, local_offset)?
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{normalize_due_date, parse_due_date};
    use time::macros::{datetime, offset};
    use time::UtcOffset;

    #[test]
    fn parses_rfc3339_with_its_own_offset() {
        let parsed = parse_due_date("2025-06-01T10:30:00+02:00", UtcOffset::UTC).unwrap();
        assert_eq!(parsed, datetime!(2025-06-01 08:30:00 UTC));
    }

    #[test]
    fn parses_datetime_local_in_given_offset() {
        let parsed = parse_due_date("2025-06-01T10:30", offset!(+2)).unwrap();
        assert_eq!(parsed, datetime!(2025-06-01 10:30:00 +2));
    }

    #[test]
    fn accepts_space_separator_and_seconds() {
        let parsed = parse_due_date("2025-06-01 10:30:15", UtcOffset::UTC).unwrap();
        assert_eq!(parsed, datetime!(2025-06-01 10:30:15 UTC));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_due_date("tomorrow-ish", UtcOffset::UTC).unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = parse_due_date("   ", UtcOffset::UTC).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn normalizes_to_rfc3339() {
        let normalized = normalize_due_date("2025-06-01T10:30", UtcOffset::UTC).unwrap();
        assert_eq!(normalized, "2025-06-01T10:30:00Z");
    }
}
