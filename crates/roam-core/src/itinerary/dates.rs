use chrono::NaiveDate;

use super::ItineraryError;

/// Parse a `YYYY-MM-DD` date. Blank input means "not given".
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, ItineraryError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ItineraryError::InvalidDate {
            value: value.to_owned(),
        })
}

/// Number of calendar days from `start` to `end`, both inclusive.
pub fn trip_length(start: NaiveDate, end: NaiveDate) -> Result<u32, ItineraryError> {
    if end < start {
        return Err(ItineraryError::EndBeforeStart { start, end });
    }
    let days = (end - start).num_days() + 1;
    u32::try_from(days).map_err(|_| ItineraryError::TooLong)
}
