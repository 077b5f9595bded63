//! Byte-order and bit-layout helpers.
//!
//! Every scalar is moved between a byte window and a value by copying the
//! bytes into a same-width integer; signed and floating types go through their
//! unsigned bit pattern so a swap never depends on the value's sign.

/// Reverse the byte order of a fixed-width scalar. One-byte types are unchanged.
pub trait ByteSwap: Copy {
    fn byte_swap(self) -> Self;
}

/// A fixed-width value that can be loaded from and stored to a byte window.
pub trait Scalar: ByteSwap {
    const WIDTH: usize;

    /// Read `WIDTH` little-endian bytes from the start of `bytes`.
    fn from_le_slice(bytes: &[u8]) -> Option<Self>;

    fn to_le_vec(self) -> Vec<u8>;

    /// Parse a hexadecimal bit pattern of this width (optional `0x` prefix).
    fn from_hex(s: &str) -> Option<Self>;
}

fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

macro_rules! impl_integer_scalar {
    ($($t:ty => $u:ty),* $(,)?) => {$(
        impl ByteSwap for $t {
            #[inline]
            fn byte_swap(self) -> Self {
                (self as $u).swap_bytes() as $t
            }
        }

        impl Scalar for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                let raw = bytes.get(..Self::WIDTH)?.try_into().ok()?;
                Some(<$t>::from_le_bytes(raw))
            }

            fn to_le_vec(self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn from_hex(s: &str) -> Option<Self> {
                let digits = strip_hex_prefix(s);
                if digits.is_empty() || digits.starts_with(['+', '-']) {
                    return None;
                }
                <$u>::from_str_radix(digits, 16).ok().map(|v| v as $t)
            }
        }
    )*};
}

impl_integer_scalar!(
    u8 => u8, i8 => u8,
    u16 => u16, i16 => u16,
    u32 => u32, i32 => u32,
    u64 => u64, i64 => u64,
);

macro_rules! impl_float_scalar {
    ($($t:ty => $u:ty),* $(,)?) => {$(
        impl ByteSwap for $t {
            #[inline]
            fn byte_swap(self) -> Self {
                <$t>::from_bits(self.to_bits().swap_bytes())
            }
        }

        impl Scalar for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                <$u>::from_le_slice(bytes).map(<$t>::from_bits)
            }

            fn to_le_vec(self) -> Vec<u8> {
                self.to_bits().to_le_vec()
            }

            fn from_hex(s: &str) -> Option<Self> {
                <$u>::from_hex(s).map(<$t>::from_bits)
            }
        }
    )*};
}

impl_float_scalar!(f32 => u32, f64 => u64);

/// Load a scalar from the start of `bytes`, honouring the byte order flag.
pub fn load<T: Scalar>(bytes: &[u8], big_endian: bool) -> Option<T> {
    let value = T::from_le_slice(bytes)?;
    Some(if big_endian { value.byte_swap() } else { value })
}

/// Inverse of [`load`].
pub fn store<T: Scalar>(value: T, big_endian: bool) -> Vec<u8> {
    let value = if big_endian { value.byte_swap() } else { value };
    value.to_le_vec()
}

/// Separator placed between byte groups of a binary string
pub const BINARY_GROUP_SEPARATOR: &str = "  ";

/// Render bytes (most significant first) as groups of eight binary digits.
pub fn format_binary_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:08b}", b))
        .collect::<Vec<_>>()
        .join(BINARY_GROUP_SEPARATOR)
}

/// Render the low `width` bytes of `value`, most significant byte first.
pub fn format_binary_value(value: u64, width: usize) -> String {
    let width = width.clamp(1, 8);
    let bytes = value.to_be_bytes();
    format_binary_string(&bytes[8 - width..])
}

/// Parse a binary string of exactly `width * 8` digits once spaces are removed.
pub fn parse_binary_string(s: &str, width: usize) -> Option<u64> {
    if !(1..=8).contains(&width) {
        return None;
    }
    let digits: String = s.chars().filter(|c| *c != ' ').collect();
    if digits.len() != width * 8 || !digits.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u64::from_str_radix(&digits, 2).ok()
}
