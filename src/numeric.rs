//! Integer, floating point and binary-digit views.

use crate::bits::{format_binary_value, load, parse_binary_string, store, Scalar};
use crate::error::CodecError;
use std::fmt::{Display, LowerExp, UpperHex};
use std::str::FromStr;

/// Decimal, or zero-padded upper-case hex two characters per byte.
pub fn decode_integer<T>(bytes: &[u8], big_endian: bool, show_hex: bool) -> Option<String>
where
    T: Scalar + Display + UpperHex,
{
    let value: T = load(bytes, big_endian)?;
    Some(if show_hex {
        format!("{:0width$X}", value, width = T::WIDTH * 2)
    } else {
        value.to_string()
    })
}

/// Parse decimal, or hex when `show_hex` is set, and produce the bytes to write.
pub fn encode_integer<T>(input: &str, big_endian: bool, show_hex: bool) -> Result<Vec<u8>, CodecError>
where
    T: Scalar + FromStr,
{
    let value = if show_hex {
        T::from_hex(input)
    } else {
        input.trim().parse::<T>().ok()
    }
    .ok_or(CodecError::Format)?;
    Ok(store(value, big_endian))
}

/// Floating point types shown in scientific notation.
///
/// Text uses Rust's `LowerExp` form: `1.500000000e0` or `-2.500000000e-7`, whose
/// exponents carry no `+` sign or zero padding, unlike C's `%e`
/// (`1.500000000e+00`). Parsing accepts both.
pub trait FloatView: Scalar + LowerExp + FromStr {
    /// Digits after the decimal point; enough to round-trip every value
    const PRECISION: usize;

    fn bits_hex(self) -> String;
}

impl FloatView for f32 {
    const PRECISION: usize = 9;

    fn bits_hex(self) -> String {
        format!("{:08X}", self.to_bits())
    }
}

impl FloatView for f64 {
    const PRECISION: usize = 18;

    fn bits_hex(self) -> String {
        format!("{:016X}", self.to_bits())
    }
}

pub fn decode_float<T: FloatView>(bytes: &[u8], big_endian: bool, show_hex: bool) -> Option<String> {
    let value: T = load(bytes, big_endian)?;
    Some(if show_hex {
        value.bits_hex()
    } else {
        format!("{:.*e}", T::PRECISION, value)
    })
}

/// In hex mode the input is the raw bit pattern of the float.
pub fn encode_float<T: FloatView>(input: &str, big_endian: bool, show_hex: bool) -> Result<Vec<u8>, CodecError> {
    let value = if show_hex {
        T::from_hex(input)
    } else {
        input.trim().parse::<T>().ok()
    }
    .ok_or(CodecError::Format)?;
    Ok(store(value, big_endian))
}

fn load_unsigned(bytes: &[u8], width: usize, big_endian: bool) -> Option<u64> {
    match width {
        1 => load::<u8>(bytes, big_endian).map(u64::from),
        2 => load::<u16>(bytes, big_endian).map(u64::from),
        4 => load::<u32>(bytes, big_endian).map(u64::from),
        8 => load::<u64>(bytes, big_endian),
        _ => None,
    }
}

fn store_unsigned(value: u64, width: usize, big_endian: bool) -> Option<Vec<u8>> {
    match width {
        1 => u8::try_from(value).ok().map(|v| store(v, big_endian)),
        2 => u16::try_from(value).ok().map(|v| store(v, big_endian)),
        4 => u32::try_from(value).ok().map(|v| store(v, big_endian)),
        8 => Some(store(value, big_endian)),
        _ => None,
    }
}

/// Binary digits of the `width`-byte integer at the start of `bytes`.
pub fn decode_binary(bytes: &[u8], width: usize, big_endian: bool) -> Option<String> {
    load_unsigned(bytes, width, big_endian).map(|v| format_binary_value(v, width))
}

pub fn encode_binary(input: &str, width: usize, big_endian: bool) -> Result<Vec<u8>, CodecError> {
    let value = parse_binary_string(input, width).ok_or(CodecError::Format)?;
    store_unsigned(value, width, big_endian).ok_or(CodecError::Format)
}
