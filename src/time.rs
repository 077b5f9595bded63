//! Timestamp encodings.
//!
//! Each format is a pure decode/encode pair between its raw value and a
//! [`CalendarTime`]. Decoders return `None` when the raw value has no calendar
//! meaning. Epoch arithmetic pivots through FILETIME ticks (100 ns since
//! 1601-01-01 UTC).

use crate::bits::{load, store};
use crate::datefmt::CalendarTime;
use crate::error::CodecError;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

pub const TICKS_PER_MS: u64 = 10_000;
pub const TICKS_PER_SECOND: u64 = 10_000_000;
pub const TICKS_PER_DAY: u64 = 864_000_000_000;
/// Seconds between 1601-01-01 and 1970-01-01
pub const UNIX_EPOCH_DIFF_SECS: u64 = 11_644_473_600;
/// 1970-01-01 expressed as FILETIME ticks
pub const UNIX_EPOCH_TICKS: u64 = UNIX_EPOCH_DIFF_SECS * TICKS_PER_SECOND;

const MS_PER_DAY: f64 = 86_400_000.0;
/// OLE automation dates span 0100-01-01 ..= 9999-12-31
const OLE_MIN_DAYS: f64 = -657_434.0;
const OLE_MAX_DAYS: f64 = 2_958_466.0;

fn filetime_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1601, 1, 1)?.and_hms_opt(0, 0, 0)
}

fn ole_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// FILETIME ticks to calendar time. Values with the top bit set are rejected.
pub fn ticks_to_calendar(ticks: u64) -> Option<CalendarTime> {
    if ticks > i64::MAX as u64 {
        return None;
    }
    let ms = i64::try_from(ticks / TICKS_PER_MS).ok()?;
    let dt = filetime_epoch()?.checked_add_signed(Duration::try_milliseconds(ms)?)?;
    CalendarTime::from_naive(&dt)
}

/// Calendar time to FILETIME ticks; `None` before 1601 or for invalid fields.
pub fn calendar_to_ticks(t: &CalendarTime) -> Option<u64> {
    let dt = t.to_naive()?;
    let ms = dt.signed_duration_since(filetime_epoch()?).num_milliseconds();
    u64::try_from(ms).ok()?.checked_mul(TICKS_PER_MS)
}

// Unix time

pub fn decode_time32(value: i32) -> Option<CalendarTime> {
    // Unix times before 1970 are not considered valid
    if value < 0 {
        return None;
    }
    ticks_to_calendar(UNIX_EPOCH_TICKS + value as u64 * TICKS_PER_SECOND)
}

pub fn encode_time32(t: &CalendarTime) -> Result<i32, CodecError> {
    let secs = unix_seconds(t)?;
    i32::try_from(secs).map_err(|_| CodecError::Range("beyond the 32-bit Unix time limit"))
}

pub fn decode_time64(value: i64) -> Option<CalendarTime> {
    if value < 0 {
        return None;
    }
    let ticks = (value as u64)
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(UNIX_EPOCH_TICKS)?;
    ticks_to_calendar(ticks)
}

pub fn encode_time64(t: &CalendarTime) -> Result<i64, CodecError> {
    unix_seconds(t)
}

fn unix_seconds(t: &CalendarTime) -> Result<i64, CodecError> {
    if t.year < 1970 {
        return Err(CodecError::Range("Unix time before 1970"));
    }
    let ticks = calendar_to_ticks(t).ok_or(CodecError::Format)?;
    let secs = ticks / TICKS_PER_SECOND - UNIX_EPOCH_DIFF_SECS;
    i64::try_from(secs).map_err(|_| CodecError::Range("beyond the 64-bit Unix time limit"))
}

// FILETIME

pub fn decode_filetime(value: u64) -> Option<CalendarTime> {
    ticks_to_calendar(value)
}

pub fn encode_filetime(t: &CalendarTime) -> Result<u64, CodecError> {
    calendar_to_ticks(t).ok_or(CodecError::Range("before 1601"))
}

// OLE automation date

pub fn decode_ole(value: f64) -> Option<CalendarTime> {
    if !value.is_finite() || !(OLE_MIN_DAYS..OLE_MAX_DAYS).contains(&value) {
        return None;
    }
    // The fraction is the time of day regardless of the sign of the day count
    let days = value.trunc();
    let millis = ((value - days).abs() * MS_PER_DAY).round() as i64;
    let dt = ole_epoch()?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_days(days as i64)?)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)?;
    CalendarTime::from_naive(&dt)
}

pub fn encode_ole(t: &CalendarTime) -> Result<f64, CodecError> {
    let dt = t.to_naive().ok_or(CodecError::Format)?;
    if !(100..=9999).contains(&t.year) {
        return Err(CodecError::Range("OLE dates cover years 100 to 9999"));
    }
    let days = dt.date().signed_duration_since(ole_epoch().ok_or(CodecError::Format)?).num_days();
    let time_ms = dt.time().num_seconds_from_midnight() as u64 * 1000
        + u64::from(t.milliseconds);
    let fraction = time_ms as f64 / MS_PER_DAY;
    let days = days as f64;
    Ok(if days >= 0.0 { days + fraction } else { days - fraction })
}

// Java time: signed milliseconds since 1970

pub fn decode_java(value: i64) -> Option<CalendarTime> {
    let delta = value.unsigned_abs().checked_mul(TICKS_PER_MS)?;
    let ticks = if value >= 0 {
        UNIX_EPOCH_TICKS.checked_add(delta)?
    } else {
        UNIX_EPOCH_TICKS.checked_sub(delta)?
    };
    ticks_to_calendar(ticks)
}

pub fn encode_java(t: &CalendarTime) -> Result<i64, CodecError> {
    let ticks = calendar_to_ticks(t).ok_or(CodecError::Range("before 1601"))?;
    // Distance from the epoch is taken as a magnitude, then signed by direction
    let diff = if UNIX_EPOCH_TICKS > ticks {
        -((UNIX_EPOCH_TICKS - ticks) as i64)
    } else {
        (ticks - UNIX_EPOCH_TICKS) as i64
    };
    Ok(diff / TICKS_PER_MS as i64)
}

// MS-DOS date/time: time in the low word, date in the high word

const DOS_DAY_MASK: u32 = 0x1F;
const DOS_MONTH_SHIFT: u32 = 5;
const DOS_MONTH_MASK: u32 = 0x0F;
const DOS_YEAR_SHIFT: u32 = 9;
const DOS_SECOND_MASK: u32 = 0x1F;
const DOS_MINUTE_SHIFT: u32 = 5;
const DOS_MINUTE_MASK: u32 = 0x3F;
const DOS_HOUR_SHIFT: u32 = 11;
const DOS_YEAR_BASE: u16 = 1980;

pub fn decode_ms_dos(value: u32) -> Option<CalendarTime> {
    let time = value & 0xFFFF;
    let date = value >> 16;
    let year = i32::from(DOS_YEAR_BASE) + (date >> DOS_YEAR_SHIFT) as i32;
    let month = (date >> DOS_MONTH_SHIFT) & DOS_MONTH_MASK;
    let day = date & DOS_DAY_MASK;
    let hour = time >> DOS_HOUR_SHIFT;
    let minute = (time >> DOS_MINUTE_SHIFT) & DOS_MINUTE_MASK;
    let second = (time & DOS_SECOND_MASK) * 2;
    let dt = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    CalendarTime::from_naive(&dt)
}

/// Seconds are stored with two-second resolution; milliseconds are dropped.
pub fn encode_ms_dos(t: &CalendarTime) -> Result<u32, CodecError> {
    t.to_naive().ok_or(CodecError::Format)?;
    if !(DOS_YEAR_BASE..=DOS_YEAR_BASE + 127).contains(&t.year) {
        return Err(CodecError::Range("MS-DOS dates cover years 1980 to 2107"));
    }
    let date = (u32::from(t.year - DOS_YEAR_BASE) << DOS_YEAR_SHIFT)
        | (u32::from(t.month) << DOS_MONTH_SHIFT)
        | u32::from(t.day);
    let time = (u32::from(t.hour) << DOS_HOUR_SHIFT)
        | (u32::from(t.minute) << DOS_MINUTE_SHIFT)
        | u32::from(t.second / 2);
    Ok((date << 16) | time)
}

// UDTTM: minute:6 hour:5 day:5 month:4 year:9 weekday:3, from the low bit

const UDTTM_MINUTE_MASK: u32 = 0x3F;
const UDTTM_HOUR_SHIFT: u32 = 6;
const UDTTM_HOUR_MASK: u32 = 0x1F;
const UDTTM_DAY_SHIFT: u32 = 11;
const UDTTM_DAY_MASK: u32 = 0x1F;
const UDTTM_MONTH_SHIFT: u32 = 16;
const UDTTM_MONTH_MASK: u32 = 0x0F;
const UDTTM_YEAR_SHIFT: u32 = 20;
const UDTTM_YEAR_MASK: u32 = 0x1FF;
const UDTTM_WEEKDAY_SHIFT: u32 = 29;
const UDTTM_WEEKDAY_MASK: u32 = 0x07;
const UDTTM_YEAR_BASE: u16 = 1900;
/// Weekday values at or above this are rejected
const UDTTM_WEEKDAY_LIMIT: u32 = 6;

/// Unpacked UDTTM bitfields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Udttm {
    pub minute: u32,
    pub hour: u32,
    pub day: u32,
    pub month: u32,
    /// Years since 1900
    pub year: u32,
    pub weekday: u32,
}

impl Udttm {
    pub fn unpack(value: u32) -> Self {
        Self {
            minute: value & UDTTM_MINUTE_MASK,
            hour: (value >> UDTTM_HOUR_SHIFT) & UDTTM_HOUR_MASK,
            day: (value >> UDTTM_DAY_SHIFT) & UDTTM_DAY_MASK,
            month: (value >> UDTTM_MONTH_SHIFT) & UDTTM_MONTH_MASK,
            year: (value >> UDTTM_YEAR_SHIFT) & UDTTM_YEAR_MASK,
            weekday: (value >> UDTTM_WEEKDAY_SHIFT) & UDTTM_WEEKDAY_MASK,
        }
    }

    /// Pack the fields; out-of-width values are masked.
    pub fn pack(&self) -> u32 {
        (self.minute & UDTTM_MINUTE_MASK)
            | ((self.hour & UDTTM_HOUR_MASK) << UDTTM_HOUR_SHIFT)
            | ((self.day & UDTTM_DAY_MASK) << UDTTM_DAY_SHIFT)
            | ((self.month & UDTTM_MONTH_MASK) << UDTTM_MONTH_SHIFT)
            | ((self.year & UDTTM_YEAR_MASK) << UDTTM_YEAR_SHIFT)
            | ((self.weekday & UDTTM_WEEKDAY_MASK) << UDTTM_WEEKDAY_SHIFT)
    }

    pub fn is_sane(&self) -> bool {
        (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && (1..=12).contains(&self.month)
            && self.weekday < UDTTM_WEEKDAY_LIMIT
    }
}

pub fn decode_udttm(value: u32) -> Option<CalendarTime> {
    let d = Udttm::unpack(value);
    if !d.is_sane() {
        return None;
    }
    Some(CalendarTime {
        year: UDTTM_YEAR_BASE + d.year as u16,
        month: d.month as u16,
        day_of_week: d.weekday as u16,
        day: d.day as u16,
        hour: d.hour as u16,
        minute: d.minute as u16,
        second: 0,
        milliseconds: 0,
    })
}

/// Minute resolution; seconds and milliseconds are dropped.
pub fn encode_udttm(t: &CalendarTime) -> Result<u32, CodecError> {
    if !(UDTTM_YEAR_BASE..=UDTTM_YEAR_BASE + UDTTM_YEAR_MASK as u16).contains(&t.year) {
        return Err(CodecError::Range("UDTTM dates cover years 1900 to 2411"));
    }
    let fields = Udttm {
        minute: t.minute.into(),
        hour: t.hour.into(),
        day: t.day.into(),
        month: t.month.into(),
        year: u32::from(t.year - UDTTM_YEAR_BASE),
        weekday: t.day_of_week.into(),
    };
    if fields.weekday >= UDTTM_WEEKDAY_LIMIT {
        return Err(CodecError::Range("Saturday is not encodable as UDTTM"));
    }
    if !fields.is_sane() {
        return Err(CodecError::Range("UDTTM fields out of range"));
    }
    Ok(fields.pack())
}

// SYSTEMTIME: eight 16-bit members, each swapped on its own

pub const SYSTEMTIME_SIZE: usize = 16;

pub fn decode_system_time(bytes: &[u8], big_endian: bool) -> Option<CalendarTime> {
    if bytes.len() < SYSTEMTIME_SIZE {
        return None;
    }
    let word = |i: usize| load::<u16>(&bytes[i * 2..], big_endian);
    Some(CalendarTime {
        year: word(0)?,
        month: word(1)?,
        day_of_week: word(2)?,
        day: word(3)?,
        hour: word(4)?,
        minute: word(5)?,
        second: word(6)?,
        milliseconds: word(7)?,
    })
}

pub fn encode_system_time(t: &CalendarTime, big_endian: bool) -> Vec<u8> {
    [
        t.year,
        t.month,
        t.day_of_week,
        t.day,
        t.hour,
        t.minute,
        t.second,
        t.milliseconds,
    ]
    .into_iter()
    .flat_map(|w| store(w, big_endian))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datefmt::{parse_calendar, FormatSpec};

    fn cal(s: &str) -> CalendarTime {
        parse_calendar(s, &FormatSpec::default()).unwrap()
    }

    #[test]
    fn test_epoch_constant() {
        let unix = cal("01/01/1970 00:00:00");
        assert_eq!(calendar_to_ticks(&unix), Some(UNIX_EPOCH_TICKS));
        assert_eq!(ticks_to_calendar(UNIX_EPOCH_TICKS), Some(unix));
        assert_eq!(ticks_to_calendar(0), Some(cal("01/01/1601")));
    }

    #[test]
    fn test_time32() {
        assert_eq!(decode_time32(0), Some(cal("01/01/1970")));
        assert_eq!(decode_time32(86_400 + 61), Some(cal("01/02/1970 00:01:01")));
        assert_eq!(decode_time32(-1), None);
        assert_eq!(decode_time32(i32::MIN), None);
        assert_eq!(decode_time32(i32::MAX), Some(cal("01/19/2038 03:14:07")));

        assert_eq!(encode_time32(&cal("01/02/1970 00:01:01")), Ok(86_461));
        assert!(matches!(
            encode_time32(&cal("12/31/1969 23:59:59")),
            Err(CodecError::Range(_))
        ));
        assert!(matches!(
            encode_time32(&cal("01/19/2038 03:14:08")),
            Err(CodecError::Range(_))
        ));
    }

    #[test]
    fn test_time64() {
        assert_eq!(decode_time64(-5), None);
        let t = cal("06/30/2500 12:00:00");
        let raw = encode_time64(&t).unwrap();
        assert_eq!(decode_time64(raw), Some(t));
        assert_eq!(decode_time64(i64::MAX), None);
        assert!(encode_time64(&cal("01/01/1969")).is_err());
    }

    #[test]
    fn test_filetime() {
        let t = cal("10/26/2023 08:15:30.250");
        let raw = encode_filetime(&t).unwrap();
        assert_eq!(raw % TICKS_PER_MS, 0);
        assert_eq!(decode_filetime(raw), Some(t));
        assert_eq!(decode_filetime(u64::MAX), None);
        assert_eq!(encode_filetime(&cal("12/31/1600 23:59:59")), Err(CodecError::Range("before 1601")));
    }

    #[test]
    fn test_ole() {
        assert_eq!(decode_ole(0.0), Some(cal("12/30/1899")));
        assert_eq!(decode_ole(2.5), Some(cal("01/01/1900 12:00:00")));
        // Negative values count days backwards but time of day forwards
        assert_eq!(decode_ole(-1.25), Some(cal("12/29/1899 06:00:00")));
        assert_eq!(decode_ole(f64::NAN), None);
        assert_eq!(decode_ole(1.0e9), None);

        assert_eq!(encode_ole(&cal("12/29/1899 06:00:00")), Ok(-1.25));
        for s in ["01/01/0100", "12/31/9999 23:59:59.999", "07/04/1776 17:30:00.123"] {
            let t = cal(s);
            assert_eq!(decode_ole(encode_ole(&t).unwrap()), Some(t), "{}", s);
        }
        assert!(encode_ole(&cal("12/31/0099")).is_err());
    }

    #[test]
    fn test_java() {
        assert_eq!(decode_java(0), Some(cal("01/01/1970")));
        assert_eq!(decode_java(1_500), Some(cal("01/01/1970 00:00:01.500")));
        assert_eq!(decode_java(-1_500), Some(cal("12/31/1969 23:59:58.500")));
        assert_eq!(encode_java(&cal("12/31/1969 23:59:58.500")), Ok(-1_500));
        assert_eq!(decode_java(i64::MIN), None);
        let t = cal("02/29/2024 23:59:59.999");
        assert_eq!(decode_java(encode_java(&t).unwrap()), Some(t));
    }

    #[test]
    fn test_ms_dos() {
        // 2021-06-15 10:30:44
        let raw = ((41u32 << 9 | 6 << 5 | 15) << 16) | (10 << 11 | 30 << 5 | 22);
        assert_eq!(decode_ms_dos(raw), Some(cal("06/15/2021 10:30:44")));
        assert_eq!(encode_ms_dos(&cal("06/15/2021 10:30:45")), Ok(raw));
        assert_eq!(decode_ms_dos(0), None);
        assert!(encode_ms_dos(&cal("12/31/1979")).is_err());
        assert!(encode_ms_dos(&cal("01/01/2108")).is_err());
    }

    fn udttm(day: u32, hour: u32, minute: u32, month: u32, weekday: u32) -> u32 {
        Udttm {
            minute,
            hour,
            day,
            month,
            year: 124,
            weekday,
        }
        .pack()
    }

    #[test]
    fn test_udttm_sanity() {
        assert!(decode_udttm(udttm(15, 23, 59, 12, 5)).is_some());
        for raw in [
            udttm(0, 23, 59, 12, 5),
            udttm(32, 23, 59, 12, 5),
            udttm(15, 24, 59, 12, 5),
            udttm(15, 23, 60, 12, 5),
            udttm(15, 23, 59, 0, 5),
            udttm(15, 23, 59, 13, 5),
            udttm(15, 23, 59, 12, 6),
        ] {
            assert_eq!(decode_udttm(raw), None, "{:#010x}", raw);
        }
    }

    #[test]
    fn test_udttm_round_trip() {
        // Friday
        let t = cal("12/13/2024 23:59");
        let raw = encode_udttm(&t).unwrap();
        assert_eq!(Udttm::unpack(raw).year, 124);
        assert_eq!(decode_udttm(raw), Some(t));
        assert!(encode_udttm(&cal("01/01/1899")).is_err());
    }

    #[test]
    fn test_udttm_saturday_rejected() {
        assert_eq!(
            encode_udttm(&cal("12/14/2024 10:00")),
            Err(CodecError::Range("Saturday is not encodable as UDTTM"))
        );
        assert!(encode_udttm(&cal("12/15/2024 10:00")).is_ok());
    }

    #[test]
    fn test_system_time_per_field_swap() {
        let t = cal("03/15/2024 13:05:09.042");
        let le = encode_system_time(&t, false);
        let be = encode_system_time(&t, true);
        assert_eq!(&le[..2], &[0xE8, 0x07]);
        assert_eq!(&be[..2], &[0x07, 0xE8]);
        // Each member is swapped in place, not the block as a whole
        assert_eq!(&be[2..4], &[0x00, 0x03]);
        assert_eq!(decode_system_time(&le, false), Some(t));
        assert_eq!(decode_system_time(&be, true), Some(t));
        assert_eq!(decode_system_time(&le[..15], false), None);
    }
}
