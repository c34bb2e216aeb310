//! RFC 3339 parsing and formatting for UTC timestamps.
//!
//! Converts between RFC 3339 strings and the `(seconds, nanos)` pair stored
//! in the MessagePack timestamp extension. Formatting always emits UTC (`Z`);
//! parsing accepts `Z` or a numeric offset and converts to UTC.

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Error type for RFC 3339 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

fn invalid(what: &str, input: &str) -> DateTimeParseError {
    DateTimeParseError {
        message: format!("Invalid {} in timestamp: {}", what, input),
    }
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str) -> Result<i16, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    if offset.len() != 6 || offset.as_bytes()[3] != b':' {
        return Err(invalid("timezone offset", offset));
    }

    let sign = match offset.as_bytes()[0] {
        b'+' => 1i16,
        b'-' => -1i16,
        _ => return Err(invalid("timezone offset", offset)),
    };

    let hours: i16 = offset[1..3]
        .parse()
        .map_err(|_| invalid("timezone offset", offset))?;
    let minutes: i16 = offset[4..6]
        .parse()
        .map_err(|_| invalid("timezone offset", offset))?;

    if hours > 23 || minutes > 59 {
        return Err(invalid("timezone offset", offset));
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Parses fractional seconds digits and returns nanoseconds.
///
/// Digits beyond nanosecond precision are truncated.
fn parse_fractional_seconds(frac: &str) -> u32 {
    let mut nanos = 0u32;
    let mut digits = 0;
    for b in frac.bytes().take(9) {
        nanos = nanos * 10 + (b - b'0') as u32;
        digits += 1;
    }
    for _ in digits..9 {
        nanos *= 10;
    }
    nanos
}

/// Formats nanoseconds as fractional seconds, omitting if zero.
fn format_fractional_seconds(nanos: u32) -> String {
    if nanos == 0 {
        return String::new();
    }

    let str = format!("{:09}", nanos);
    let trimmed = str.trim_end_matches('0');
    format!(".{}", trimmed)
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date (Howard Hinnant's algorithm).
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // year of era
    let doy = (153 * m + 2) / 5 + day as i64 - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // day of era
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Parses an RFC 3339 datetime string and returns UTC seconds since the Unix
/// epoch plus nanoseconds.
pub fn parse_timestamp_rfc3339(input: &str) -> Result<(i64, u32), DateTimeParseError> {
    // Minimum length is 19 (YYYY-MM-DDTHH:MM:SS)
    if input.len() < 19 || !input.is_ascii() {
        return Err(invalid("format", input));
    }

    let bytes = input.as_bytes();
    if !matches!(bytes[10], b'T' | b't' | b' ')
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return Err(invalid("format", input));
    }

    let year: i64 = input[..4].parse().map_err(|_| invalid("year", input))?;
    let month: u32 = input[5..7].parse().map_err(|_| invalid("month", input))?;
    let day: u32 = input[8..10].parse().map_err(|_| invalid("day", input))?;
    let hours: i64 = input[11..13].parse().map_err(|_| invalid("hours", input))?;
    let minutes: i64 = input[14..16].parse().map_err(|_| invalid("minutes", input))?;
    let seconds: i64 = input[17..19].parse().map_err(|_| invalid("seconds", input))?;

    if !(1..=12).contains(&month) {
        return Err(invalid("month", input));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(invalid("day", input));
    }
    if hours > 23 {
        return Err(invalid("hours", input));
    }
    if minutes > 59 {
        return Err(invalid("minutes", input));
    }
    if seconds > 59 {
        return Err(invalid("seconds", input));
    }

    let rest = &input[19..];
    let (nanos, offset_str) = if let Some(frac_rest) = rest.strip_prefix('.') {
        let frac_end = frac_rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac_rest.len());
        if frac_end == 0 {
            return Err(invalid("fractional seconds", input));
        }
        (
            parse_fractional_seconds(&frac_rest[..frac_end]),
            &frac_rest[frac_end..],
        )
    } else {
        (0, rest)
    };

    let offset_min = if offset_str.is_empty() {
        0
    } else {
        parse_timezone_offset(offset_str)?
    };

    // local time = UTC + offset, so UTC = local - offset
    let epoch_seconds = date_to_days(year, month, day) * SECONDS_PER_DAY
        + hours * SECONDS_PER_HOUR
        + minutes * SECONDS_PER_MINUTE
        + seconds
        - offset_min as i64 * SECONDS_PER_MINUTE;

    Ok((epoch_seconds, nanos))
}

/// Formats UTC seconds since the Unix epoch plus nanoseconds as an RFC 3339
/// datetime string ending in `Z`.
pub fn format_timestamp_rfc3339(epoch_seconds: i64, nanos: u32) -> String {
    let days = epoch_seconds.div_euclid(SECONDS_PER_DAY);
    let time_seconds = epoch_seconds.rem_euclid(SECONDS_PER_DAY);

    let (year, month, day) = days_to_date(days);

    let hours = time_seconds / SECONDS_PER_HOUR;
    let minutes = (time_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = time_seconds % SECONDS_PER_MINUTE;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}Z",
        year,
        month,
        day,
        hours,
        minutes,
        seconds,
        format_fractional_seconds(nanos)
    )
}
