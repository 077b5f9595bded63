//! Uniform decode/encode over every field kind.
//!
//! [`Codec::for_field`] maps a [`FieldId`] to the codec that reads and writes
//! it; the session never switches on field kinds itself.

use crate::bits::{load, store};
use crate::datefmt::{format_calendar, parse_calendar, CalendarTime};
use crate::error::CodecError;
use crate::fields::FieldId;
use crate::guid::{decode_guid_time, encode_guid_time, format_guid, parse_guid, GuidFields};
use crate::numeric::{decode_binary, decode_float, decode_integer, encode_binary, encode_float, encode_integer};
use crate::session::InterpretationContext;
use crate::time;
use std::fmt;

/// Shown for windows whose bytes have no meaning in the field's encoding
pub const NOT_REPRESENTABLE: &str = "N/A";

/// Outcome of decoding one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Text(String),
    NotRepresentable,
}

impl DecodedValue {
    pub fn as_str(&self) -> &str {
        match self {
            DecodedValue::Text(s) => s,
            DecodedValue::NotRepresentable => NOT_REPRESENTABLE,
        }
    }
}

impl From<Option<String>> for DecodedValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(DecodedValue::NotRepresentable, DecodedValue::Text)
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    Time32,
    Time64,
    FileTime,
    Ole,
    Java,
    /// Always little-endian
    MsDos,
    /// Always little-endian
    Udttm,
    SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Binary { width: usize },
    Integer { width: usize, signed: bool },
    Float,
    Double,
    Time(TimeFormat),
    Guid,
    GuidTime,
}

impl Codec {
    /// `binary_width` is the current width of the Binary field.
    pub fn for_field(id: FieldId, binary_width: usize) -> Codec {
        match id {
            FieldId::Binary => Codec::Binary { width: binary_width },
            FieldId::Int8 => Codec::Integer { width: 1, signed: true },
            FieldId::UInt8 => Codec::Integer { width: 1, signed: false },
            FieldId::Int16 => Codec::Integer { width: 2, signed: true },
            FieldId::UInt16 => Codec::Integer { width: 2, signed: false },
            FieldId::Int32 => Codec::Integer { width: 4, signed: true },
            FieldId::UInt32 => Codec::Integer { width: 4, signed: false },
            FieldId::Int64 => Codec::Integer { width: 8, signed: true },
            FieldId::UInt64 => Codec::Integer { width: 8, signed: false },
            FieldId::Float => Codec::Float,
            FieldId::Double => Codec::Double,
            FieldId::Time32 => Codec::Time(TimeFormat::Time32),
            FieldId::Time64 => Codec::Time(TimeFormat::Time64),
            FieldId::FileTime => Codec::Time(TimeFormat::FileTime),
            FieldId::OleTime => Codec::Time(TimeFormat::Ole),
            FieldId::JavaTime => Codec::Time(TimeFormat::Java),
            FieldId::MsDosTime => Codec::Time(TimeFormat::MsDos),
            FieldId::MsCompoundTime => Codec::Time(TimeFormat::Udttm),
            FieldId::SystemTime => Codec::Time(TimeFormat::SystemTime),
            FieldId::Guid => Codec::Guid,
            FieldId::GuidEmbeddedTime => Codec::GuidTime,
        }
    }

    /// Bytes read and written by this codec
    pub fn width(&self) -> usize {
        match self {
            Codec::Binary { width } | Codec::Integer { width, .. } => *width,
            Codec::Float => 4,
            Codec::Double => 8,
            Codec::Time(TimeFormat::Time32 | TimeFormat::MsDos | TimeFormat::Udttm) => 4,
            Codec::Time(TimeFormat::SystemTime) => time::SYSTEMTIME_SIZE,
            Codec::Time(_) => 8,
            Codec::Guid | Codec::GuidTime => crate::guid::GUID_SIZE,
        }
    }

    /// The encoder rewrites part of the bytes already in place.
    pub fn needs_existing(&self) -> bool {
        matches!(self, Codec::GuidTime)
    }

    pub fn decode(&self, window: &[u8], ctx: &InterpretationContext) -> DecodedValue {
        let be = ctx.big_endian;
        let hex = ctx.show_hex;
        let text = match *self {
            Codec::Binary { width } => decode_binary(window, width, be),
            Codec::Integer { width, signed } => match (width, signed) {
                (1, true) => decode_integer::<i8>(window, be, hex),
                (1, false) => decode_integer::<u8>(window, be, hex),
                (2, true) => decode_integer::<i16>(window, be, hex),
                (2, false) => decode_integer::<u16>(window, be, hex),
                (4, true) => decode_integer::<i32>(window, be, hex),
                (4, false) => decode_integer::<u32>(window, be, hex),
                (8, true) => decode_integer::<i64>(window, be, hex),
                (8, false) => decode_integer::<u64>(window, be, hex),
                _ => None,
            },
            Codec::Float => decode_float::<f32>(window, be, hex),
            Codec::Double => decode_float::<f64>(window, be, hex),
            Codec::Time(format) => decode_time(format, window, be)
                .map(|t| format_calendar(&t, &ctx.date_format)),
            Codec::Guid => GuidFields::read(window, be).map(|g| format_guid(&g)),
            Codec::GuidTime => GuidFields::read(window, be)
                .and_then(|g| decode_guid_time(&g))
                .map(|t| format_calendar(&t, &ctx.date_format)),
        };
        text.into()
    }

    /// Parse `input` into the bytes to write. `existing` holds the current
    /// window and is only consulted when [`Codec::needs_existing`] is true.
    pub fn encode(&self, input: &str, ctx: &InterpretationContext, existing: &[u8]) -> Result<Vec<u8>, CodecError> {
        let be = ctx.big_endian;
        let hex = ctx.show_hex;
        match *self {
            Codec::Binary { width } => encode_binary(input, width, be),
            Codec::Integer { width, signed } => match (width, signed) {
                (1, true) => encode_integer::<i8>(input, be, hex),
                (1, false) => encode_integer::<u8>(input, be, hex),
                (2, true) => encode_integer::<i16>(input, be, hex),
                (2, false) => encode_integer::<u16>(input, be, hex),
                (4, true) => encode_integer::<i32>(input, be, hex),
                (4, false) => encode_integer::<u32>(input, be, hex),
                (8, true) => encode_integer::<i64>(input, be, hex),
                (8, false) => encode_integer::<u64>(input, be, hex),
                _ => Err(CodecError::Range("unsupported integer width")),
            },
            Codec::Float => encode_float::<f32>(input, be, hex),
            Codec::Double => encode_float::<f64>(input, be, hex),
            Codec::Time(format) => {
                let t = parse_calendar(input, &ctx.date_format).ok_or(CodecError::Format)?;
                encode_time(format, &t, be)
            }
            Codec::Guid => Ok(parse_guid(input)?.to_bytes(be)),
            Codec::GuidTime => {
                let t = parse_calendar(input, &ctx.date_format).ok_or(CodecError::Format)?;
                let current = GuidFields::read(existing, be).ok_or(CodecError::Range("GUID window is incomplete"))?;
                Ok(encode_guid_time(&current, &t)?.to_bytes(be))
            }
        }
    }
}

fn decode_time(format: TimeFormat, window: &[u8], be: bool) -> Option<CalendarTime> {
    match format {
        TimeFormat::Time32 => time::decode_time32(load(window, be)?),
        TimeFormat::Time64 => time::decode_time64(load(window, be)?),
        TimeFormat::FileTime => time::decode_filetime(load(window, be)?),
        TimeFormat::Ole => time::decode_ole(load(window, be)?),
        TimeFormat::Java => time::decode_java(load(window, be)?),
        TimeFormat::MsDos => time::decode_ms_dos(load(window, false)?),
        TimeFormat::Udttm => time::decode_udttm(load(window, false)?),
        TimeFormat::SystemTime => time::decode_system_time(window, be),
    }
}

fn encode_time(format: TimeFormat, t: &CalendarTime, be: bool) -> Result<Vec<u8>, CodecError> {
    Ok(match format {
        TimeFormat::Time32 => store(time::encode_time32(t)?, be),
        TimeFormat::Time64 => store(time::encode_time64(t)?, be),
        TimeFormat::FileTime => store(time::encode_filetime(t)?, be),
        TimeFormat::Ole => store(time::encode_ole(t)?, be),
        TimeFormat::Java => store(time::encode_java(t)?, be),
        TimeFormat::MsDos => store(time::encode_ms_dos(t)?, false),
        TimeFormat::Udttm => store(time::encode_udttm(t)?, false),
        TimeFormat::SystemTime => time::encode_system_time(t, be),
    })
}
