//! GUID codec and the version-1 timestamp embedded in it.

use crate::bits::{load, store};
use crate::datefmt::CalendarTime;
use crate::error::CodecError;
use crate::time::{calendar_to_ticks, ticks_to_calendar, TICKS_PER_DAY};
use uuid::Uuid;

pub const GUID_SIZE: usize = 16;

/// Days between the GUID epoch (1582-10-15) and the FILETIME epoch (1601-01-01)
pub const GUID_EPOCH_DAYS_BEFORE_FILETIME: u64 = 6653;
pub const GUID_EPOCH_OFFSET_TICKS: u64 = GUID_EPOCH_DAYS_BEFORE_FILETIME * TICKS_PER_DAY;

const VERSION_SHIFT: u32 = 12;
const TIME_HIGH_MASK: u16 = 0x0FFF;
const VERSION_1: u16 = 0x1000;
const TIMESTAMP_BITS: u32 = 60;

/// A GUID split into its three integer members and the trailing byte array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuidFields {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl GuidFields {
    /// Read from a 16-byte window. In big-endian mode only the integer
    /// members are swapped, each on its own.
    pub fn read(bytes: &[u8], big_endian: bool) -> Option<Self> {
        if bytes.len() < GUID_SIZE {
            return None;
        }
        Some(Self {
            data1: load(&bytes[0..4], big_endian)?,
            data2: load(&bytes[4..6], big_endian)?,
            data3: load(&bytes[6..8], big_endian)?,
            data4: bytes[8..16].try_into().ok()?,
        })
    }

    pub fn to_bytes(&self, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(GUID_SIZE);
        out.extend(store(self.data1, big_endian));
        out.extend(store(self.data2, big_endian));
        out.extend(store(self.data3, big_endian));
        out.extend_from_slice(&self.data4);
        out
    }

    pub fn version(&self) -> u16 {
        self.data3 >> VERSION_SHIFT
    }

    fn to_uuid(self) -> Uuid {
        Uuid::from_fields(self.data1, self.data2, self.data3, &self.data4)
    }
}

/// Canonical `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` form, upper case.
pub fn format_guid(guid: &GuidFields) -> String {
    guid.to_uuid()
        .braced()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string()
}

/// Parse a GUID string, braces optional.
pub fn parse_guid(s: &str) -> Result<GuidFields, CodecError> {
    let uuid = Uuid::parse_str(s.trim()).map_err(|_| CodecError::Format)?;
    let (data1, data2, data3, data4) = uuid.as_fields();
    Ok(GuidFields {
        data1,
        data2,
        data3,
        data4: *data4,
    })
}

/// The 60-bit v1 timestamp, or `None` if the version nibble is not 1.
pub fn embedded_timestamp(guid: &GuidFields) -> Option<u64> {
    if guid.version() != 1 {
        return None;
    }
    Some(
        (u64::from(guid.data3 & TIME_HIGH_MASK) << 48)
            | (u64::from(guid.data2) << 32)
            | u64::from(guid.data1),
    )
}

pub fn decode_guid_time(guid: &GuidFields) -> Option<CalendarTime> {
    let ticks = embedded_timestamp(guid)?.checked_sub(GUID_EPOCH_OFFSET_TICKS)?;
    ticks_to_calendar(ticks)
}

/// Rewrite the timestamp of an existing version-1 GUID. The trailing eight
/// bytes are carried over unchanged.
pub fn encode_guid_time(existing: &GuidFields, t: &CalendarTime) -> Result<GuidFields, CodecError> {
    if existing.version() != 1 {
        return Err(CodecError::Range("not a version 1 GUID"));
    }
    let ticks = calendar_to_ticks(t)
        .and_then(|ticks| ticks.checked_add(GUID_EPOCH_OFFSET_TICKS))
        .ok_or(CodecError::Range("before 1601"))?;
    if ticks >> TIMESTAMP_BITS != 0 {
        return Err(CodecError::Range("beyond the 60-bit GUID timestamp"));
    }
    Ok(GuidFields {
        data1: ticks as u32,
        data2: (ticks >> 32) as u16,
        data3: ((ticks >> 48) as u16 & TIME_HIGH_MASK) | VERSION_1,
        data4: existing.data4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datefmt::{parse_calendar, FormatSpec};

    const V1_TEXT: &str = "{C232AB00-9414-11EC-B3C8-9F6BDECED846}";

    fn cal(s: &str) -> CalendarTime {
        parse_calendar(s, &FormatSpec::default()).unwrap()
    }

    #[test]
    fn test_epoch_offset() {
        assert_eq!(GUID_EPOCH_OFFSET_TICKS, 5_748_192_000_000_000);
    }

    #[test]
    fn test_format_and_parse() {
        let guid = parse_guid(V1_TEXT).unwrap();
        assert_eq!(guid.data1, 0xC232_AB00);
        assert_eq!(guid.data2, 0x9414);
        assert_eq!(guid.data3, 0x11EC);
        assert_eq!(guid.data4, [0xB3, 0xC8, 0x9F, 0x6B, 0xDE, 0xCE, 0xD8, 0x46]);
        assert_eq!(format_guid(&guid), V1_TEXT);
        assert_eq!(parse_guid("c232ab00-9414-11ec-b3c8-9f6bdeced846"), Ok(guid));
        assert_eq!(parse_guid("{C232AB00-9414-11EC-B3C8}"), Err(CodecError::Format));
        assert_eq!(parse_guid("not a guid"), Err(CodecError::Format));
    }

    #[test]
    fn test_per_field_swap() {
        let guid = parse_guid(V1_TEXT).unwrap();
        let le = guid.to_bytes(false);
        let be = guid.to_bytes(true);
        assert_eq!(&le[..8], &[0x00, 0xAB, 0x32, 0xC2, 0x14, 0x94, 0xEC, 0x11]);
        assert_eq!(&be[..8], &[0xC2, 0x32, 0xAB, 0x00, 0x94, 0x14, 0x11, 0xEC]);
        // The byte array is never swapped
        assert_eq!(le[8..], be[8..]);
        assert_eq!(GuidFields::read(&be, true), Some(guid));
        assert_eq!(GuidFields::read(&le, false), Some(guid));
        assert_eq!(GuidFields::read(&le[..15], false), None);
    }

    #[test]
    fn test_embedded_time() {
        let guid = parse_guid(V1_TEXT).unwrap();
        assert_eq!(guid.version(), 1);
        // 2022-02-22 19:22:22 UTC
        assert_eq!(decode_guid_time(&guid), Some(cal("02/22/2022 19:22:22")));

        let v4 = parse_guid("{9C7D1A2E-3F4B-4C5D-8E6F-A0B1C2D3E4F5}").unwrap();
        assert_eq!(decode_guid_time(&v4), None);
    }

    #[test]
    fn test_embedded_time_round_trip() {
        let guid = parse_guid(V1_TEXT).unwrap();
        for s in ["01/01/1601", "10/15/1985 01:02:03.456", "12/31/3400 23:59:59.999"] {
            let t = cal(s);
            let updated = encode_guid_time(&guid, &t).unwrap();
            assert_eq!(updated.version(), 1);
            assert_eq!(updated.data4, guid.data4);
            assert_eq!(decode_guid_time(&updated), Some(t), "{}", s);
        }
    }

    #[test]
    fn test_embedded_time_rejections() {
        let v4 = parse_guid("{9C7D1A2E-3F4B-4C5D-8E6F-A0B1C2D3E4F5}").unwrap();
        assert!(matches!(
            encode_guid_time(&v4, &cal("01/01/2000")),
            Err(CodecError::Range(_))
        ));
        let v1 = parse_guid(V1_TEXT).unwrap();
        // 2^60 ticks after 1582 lands in the year 5236
        assert!(encode_guid_time(&v1, &cal("01/01/5300")).is_err());
        assert!(encode_guid_time(&v1, &cal("01/01/1600")).is_err());
    }
}
