//! Calendar values and their textual form.
//!
//! Dates are shown as `MM/DD/YYYY HH:MM:SS.mmm` with the date part reordered
//! and the separator replaced according to a [`FormatSpec`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Order of the date components, matching the host's numeric format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    #[default]
    Mdy,
    Dmy,
    Ymd,
}

impl DateOrder {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Mdy),
            1 => Some(Self::Dmy),
            2 => Some(Self::Ymd),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Mdy => 0,
            Self::Dmy => 1,
            Self::Ymd => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mdy" | "0" => Some(Self::Mdy),
            "dmy" | "1" => Some(Self::Dmy),
            "ymd" | "2" => Some(Self::Ymd),
            _ => None,
        }
    }
}

/// Date layout passed through from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    #[serde(default)]
    pub order: DateOrder,
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_separator() -> char {
    '/'
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            order: DateOrder::Mdy,
            separator: default_separator(),
        }
    }
}

impl FormatSpec {
    pub fn new(order: DateOrder, separator: char) -> Self {
        Self { order, separator }
    }
}

/// Calendar time with the same members as a Windows `SYSTEMTIME`.
///
/// Values decoded straight from raw fields are not validated; use
/// [`CalendarTime::to_naive`] to check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarTime {
    pub year: u16,
    pub month: u16,
    /// 0 = Sunday
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub milliseconds: u16,
}

impl CalendarTime {
    /// Build from a chrono value; sub-millisecond precision is truncated.
    /// Returns `None` for years outside `0..=65535`.
    pub fn from_naive(dt: &NaiveDateTime) -> Option<Self> {
        Some(Self {
            year: u16::try_from(dt.year()).ok()?,
            month: dt.month() as u16,
            day_of_week: dt.weekday().num_days_from_sunday() as u16,
            day: dt.day() as u16,
            hour: dt.hour() as u16,
            minute: dt.minute() as u16,
            second: dt.second() as u16,
            milliseconds: (dt.nanosecond() / 1_000_000).min(999) as u16,
        })
    }

    /// Validate the calendar fields. Day of week is ignored.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())?;
        let time = NaiveTime::from_hms_milli_opt(
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
            self.milliseconds.into(),
        )?;
        Some(NaiveDateTime::new(date, time))
    }
}

/// Render a calendar time according to `spec`.
pub fn format_calendar(t: &CalendarTime, spec: &FormatSpec) -> String {
    let sep = spec.separator;
    let date = match spec.order {
        DateOrder::Mdy => format!("{:02}{sep}{:02}{sep}{:04}", t.month, t.day, t.year),
        DateOrder::Dmy => format!("{:02}{sep}{:02}{sep}{:04}", t.day, t.month, t.year),
        DateOrder::Ymd => format!("{:04}{sep}{:02}{sep}{:02}", t.year, t.month, t.day),
    };
    format!(
        "{} {:02}:{:02}:{:02}.{:03}",
        date, t.hour, t.minute, t.second, t.milliseconds
    )
}

fn calendar_pattern(spec: &FormatSpec) -> Option<Regex> {
    let sep = regex::escape(&spec.separator.to_string());
    let pattern = format!(
        r"^(\d{{1,5}}){sep}(\d{{1,5}}){sep}(\d{{1,5}})(?:[ T]+(\d{{1,2}}):(\d{{1,2}})(?::(\d{{1,2}})(?:\.(\d{{1,3}}))?)?)?$"
    );
    Regex::new(&pattern).ok()
}

/// Parse a date string laid out per `spec`. The time part is optional, as are
/// its seconds and milliseconds. Returns `None` for malformed or impossible dates.
pub fn parse_calendar(s: &str, spec: &FormatSpec) -> Option<CalendarTime> {
    let re = calendar_pattern(spec)?;
    let caps = re.captures(s.trim())?;

    let num = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let (first, second, third) = (num(1)?, num(2)?, num(3)?);
    let (year, month, day) = match spec.order {
        DateOrder::Mdy => (third, first, second),
        DateOrder::Dmy => (third, second, first),
        DateOrder::Ymd => (first, second, third),
    };

    let millis = match caps.get(7) {
        // ".5" means 500 ms
        Some(m) => format!("{:0<3}", m.as_str()).parse::<u32>().ok()?,
        None => 0,
    };

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let time = NaiveTime::from_hms_milli_opt(num(4)?, num(5)?, num(6)?, millis)?;
    CalendarTime::from_naive(&NaiveDateTime::new(date, time))
}
