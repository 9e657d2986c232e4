//! ISO-8601 combined period and duration values such as `P1Y2M3DT4H5M6.5S`.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::error::{KiotaError, Result};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A calendar period (years, months, days) combined with a clock duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeriodAndDuration {
    years: i32,
    months: i32,
    days: i32,
    hours: i64,
    minutes: i64,
    seconds: i64,
    nanos: u32,
}

impl PeriodAndDuration {
    /// Creates a value with only a date part.
    pub fn from_period(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
            ..Self::default()
        }
    }

    /// Creates a value with only a time part.
    pub fn from_time(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            ..Self::default()
        }
    }

    /// Sets the date part.
    pub fn with_period(mut self, years: i32, months: i32, days: i32) -> Self {
        self.years = years;
        self.months = months;
        self.days = days;
        self
    }

    /// Sets the sub-second part; values of a second or more are carried into seconds.
    pub fn with_nanos(mut self, nanos: u32) -> Self {
        self.seconds += i64::from(nanos) / NANOS_PER_SECOND;
        self.nanos = (i64::from(nanos) % NANOS_PER_SECOND) as u32;
        self
    }

    /// Returns the years component.
    pub fn years(&self) -> i32 {
        self.years
    }

    /// Returns the months component.
    pub fn months(&self) -> i32 {
        self.months
    }

    /// Returns the days component.
    pub fn days(&self) -> i32 {
        self.days
    }

    /// Returns the hours component.
    pub fn hours(&self) -> i64 {
        self.hours
    }

    /// Returns the minutes component.
    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// Returns the whole seconds component.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Returns the sub-second component in nanoseconds.
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Returns `true` if every component is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the time part as a `chrono::TimeDelta`, or `None` if it does not fit.
    pub fn time_part(&self) -> Option<TimeDelta> {
        TimeDelta::try_hours(self.hours)?
            .checked_add(&TimeDelta::try_minutes(self.minutes)?)?
            .checked_add(&TimeDelta::try_seconds(self.seconds)?)?
            .checked_add(&TimeDelta::nanoseconds(i64::from(self.nanos)))
    }
}

fn invalid(text: &str) -> KiotaError {
    KiotaError::Serialization(format!("invalid ISO-8601 duration: {text:?}"))
}

/// Splits `part` into `(number, designator)` pairs, e.g. `1Y-2M` into `[("1", 'Y'), ("-2", 'M')]`.
fn components<'a>(part: &'a str, text: &str) -> Result<Vec<(&'a str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in part.char_indices() {
        if ch.is_ascii_alphabetic() {
            let number = &part[start..idx];
            if number.is_empty() || number == "-" || number == "+" {
                return Err(invalid(text));
            }
            out.push((number, ch.to_ascii_uppercase()));
            start = idx + ch.len_utf8();
        }
    }
    if start != part.len() {
        return Err(invalid(text));
    }
    Ok(out)
}

fn parse_int<T: FromStr>(number: &str, text: &str) -> Result<T> {
    number.parse::<T>().map_err(|_| invalid(text))
}

/// Parses `6`, `-6`, `6.5` or `6,5` into whole seconds and a non-negative nanosecond remainder.
fn parse_seconds(number: &str, text: &str) -> Result<(i64, u32)> {
    let normalized = number.replace(',', ".");
    let (whole, fraction) = match normalized.split_once('.') {
        Some((w, f)) => (w, f),
        None => (normalized.as_str(), ""),
    };
    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(text));
    }
    let negative = whole.starts_with('-');
    let whole: i64 = parse_int(whole, text)?;
    let frac_nanos: i64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().map_err(|_| invalid(text))?
    };
    let total = whole
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|n| n.checked_add(if negative { -frac_nanos } else { frac_nanos }))
        .ok_or_else(|| invalid(text))?;
    Ok((
        total.div_euclid(NANOS_PER_SECOND),
        total.rem_euclid(NANOS_PER_SECOND) as u32,
    ))
}

impl FromStr for PeriodAndDuration {
    type Err = KiotaError;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (negate, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest
            .strip_prefix('P')
            .or_else(|| rest.strip_prefix('p'))
            .ok_or_else(|| invalid(text))?;
        let (date_part, time_part) = match rest.find(['T', 't']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };
        if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
            return Err(invalid(text));
        }

        let mut value = Self::default();
        let mut seen = String::new();
        for (number, designator) in components(date_part, text)? {
            if seen.contains(designator) {
                return Err(invalid(text));
            }
            seen.push(designator);
            match designator {
                'Y' => value.years = parse_int(number, text)?,
                'M' => value.months = parse_int(number, text)?,
                'W' => {
                    let weeks = parse_int::<i32>(number, text)?;
                    value.days = weeks
                        .checked_mul(7)
                        .and_then(|days| value.days.checked_add(days))
                        .ok_or_else(|| invalid(text))?;
                }
                'D' => {
                    let days = parse_int::<i32>(number, text)?;
                    value.days = value
                        .days
                        .checked_add(days)
                        .ok_or_else(|| invalid(text))?;
                }
                _ => return Err(invalid(text)),
            }
        }

        let mut seen = String::new();
        for (number, designator) in components(time_part.unwrap_or(""), text)? {
            if seen.contains(designator) {
                return Err(invalid(text));
            }
            seen.push(designator);
            match designator {
                'H' => value.hours = parse_int(number, text)?,
                'M' => value.minutes = parse_int(number, text)?,
                'S' => (value.seconds, value.nanos) = parse_seconds(number, text)?,
                _ => return Err(invalid(text)),
            }
        }

        if negate {
            value = value.checked_neg().ok_or_else(|| invalid(text))?;
        }
        Ok(value)
    }
}

impl PeriodAndDuration {
    fn checked_neg(self) -> Option<Self> {
        let total = self
            .seconds
            .checked_mul(NANOS_PER_SECOND)?
            .checked_add(i64::from(self.nanos))?
            .checked_neg()?;
        Some(Self {
            years: self.years.checked_neg()?,
            months: self.months.checked_neg()?,
            days: self.days.checked_neg()?,
            hours: self.hours.checked_neg()?,
            minutes: self.minutes.checked_neg()?,
            seconds: total.div_euclid(NANOS_PER_SECOND),
            nanos: total.rem_euclid(NANOS_PER_SECOND) as u32,
        })
    }
}

impl fmt::Display for PeriodAndDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours == 0 && self.minutes == 0 && self.seconds == 0 && self.nanos == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        if self.hours != 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes != 0 {
            write!(f, "{}M", self.minutes)?;
        }
        if self.seconds != 0 || self.nanos != 0 {
            let total = i128::from(self.seconds) * i128::from(NANOS_PER_SECOND)
                + i128::from(self.nanos);
            let sign = if total < 0 { "-" } else { "" };
            let abs = total.unsigned_abs();
            let whole = abs / NANOS_PER_SECOND as u128;
            let frac = abs % NANOS_PER_SECOND as u128;
            if frac == 0 {
                write!(f, "{sign}{whole}S")?;
            } else {
                let digits = format!("{frac:09}");
                write!(f, "{sign}{whole}.{}S", digits.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_value() {
        let value: PeriodAndDuration = "P1Y2M3DT4H5M6S".parse().unwrap();
        assert_eq!(value.years(), 1);
        assert_eq!(value.months(), 2);
        assert_eq!(value.days(), 3);
        assert_eq!(value.hours(), 4);
        assert_eq!(value.minutes(), 5);
        assert_eq!(value.seconds(), 6);
        assert_eq!(value.to_string(), "P1Y2M3DT4H5M6S");
    }

    #[test]
    fn test_parse_time_only() {
        let value: PeriodAndDuration = "PT1H30M".parse().unwrap();
        assert_eq!(value, PeriodAndDuration::from_time(1, 30, 0));
        assert_eq!(value.to_string(), "PT1H30M");
    }

    #[test]
    fn test_parse_weeks_as_days() {
        let value: PeriodAndDuration = "P2W1D".parse().unwrap();
        assert_eq!(value.days(), 15);
    }

    #[test]
    fn test_fractional_seconds() {
        let value: PeriodAndDuration = "PT6.5S".parse().unwrap();
        assert_eq!(value.seconds(), 6);
        assert_eq!(value.nanos(), 500_000_000);
        assert_eq!(value.to_string(), "PT6.5S");

        let comma: PeriodAndDuration = "PT0,25S".parse().unwrap();
        assert_eq!(comma.nanos(), 250_000_000);
    }

    #[test]
    fn test_negative_values() {
        let value: PeriodAndDuration = "-P1DT6.5S".parse().unwrap();
        assert_eq!(value.days(), -1);
        assert_eq!(value.to_string(), "P-1DT-6.5S");

        let component: PeriodAndDuration = "P-2M".parse().unwrap();
        assert_eq!(component.months(), -2);
    }

    #[test]
    fn test_zero_formats_as_pt0s() {
        assert_eq!(PeriodAndDuration::default().to_string(), "PT0S");
        let parsed: PeriodAndDuration = "PT0S".parse().unwrap();
        assert!(parsed.is_zero());
    }

    #[test]
    fn test_invalid_text() {
        for text in ["", "P", "PT", "1Y", "P1X", "PT1Y", "P1Y1Y", "PTS", "PT1.2.3S", "P1"] {
            assert!(
                text.parse::<PeriodAndDuration>().is_err(),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_time_part() {
        let value = PeriodAndDuration::from_time(1, 2, 3).with_nanos(4);
        let expected = TimeDelta::seconds(3723) + TimeDelta::nanoseconds(4);
        assert_eq!(value.time_part(), Some(expected));

        assert_eq!(PeriodAndDuration::from_time(i64::MAX, 0, 0).time_part(), None);
    }

    #[test]
    fn test_overflowing_components_are_rejected() {
        for text in [
            "P999999999W",
            "P2147483647D1W",
            "PT9999999999999S",
            "PT-9999999999999.5S",
            "-P-2147483648Y",
            "-PT-9223372036854775808H",
        ] {
            assert!(
                text.parse::<PeriodAndDuration>().is_err(),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_of_large_seconds() {
        let value = PeriodAndDuration::from_time(0, 0, i64::MAX);
        assert_eq!(value.to_string(), format!("PT{}S", i64::MAX));
    }
}
