//! Field registry: every typed view the interpreter offers, with its width and
//! display group, plus the availability gate.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Binary,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Time32,
    Time64,
    FileTime,
    OleTime,
    JavaTime,
    MsDosTime,
    MsCompoundTime,
    SystemTime,
    Guid,
    GuidEmbeddedTime,
}

/// Display grouping only; it has no effect on behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticGroup {
    Binary,
    Integral,
    Float,
    Time,
    Misc,
    GuidTime,
}

impl SemanticGroup {
    pub fn name(&self) -> &'static str {
        match self {
            SemanticGroup::Binary => "Binary",
            SemanticGroup::Integral => "Integral",
            SemanticGroup::Float => "Floating point",
            SemanticGroup::Time => "Time",
            SemanticGroup::Misc => "Misc",
            SemanticGroup::GuidTime => "GUID time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub group: SemanticGroup,
    /// Bytes covered by the field. Binary starts at 1 and follows the selection.
    pub width: usize,
}

const fn def(id: FieldId, group: SemanticGroup, width: usize) -> FieldDefinition {
    FieldDefinition { id, group, width }
}

/// All fields in display order
pub const REGISTRY: &[FieldDefinition] = &[
    def(FieldId::Binary, SemanticGroup::Binary, 1),
    def(FieldId::Int8, SemanticGroup::Integral, 1),
    def(FieldId::UInt8, SemanticGroup::Integral, 1),
    def(FieldId::Int16, SemanticGroup::Integral, 2),
    def(FieldId::UInt16, SemanticGroup::Integral, 2),
    def(FieldId::Int32, SemanticGroup::Integral, 4),
    def(FieldId::UInt32, SemanticGroup::Integral, 4),
    def(FieldId::Int64, SemanticGroup::Integral, 8),
    def(FieldId::UInt64, SemanticGroup::Integral, 8),
    def(FieldId::Float, SemanticGroup::Float, 4),
    def(FieldId::Double, SemanticGroup::Float, 8),
    def(FieldId::Time32, SemanticGroup::Time, 4),
    def(FieldId::Time64, SemanticGroup::Time, 8),
    def(FieldId::FileTime, SemanticGroup::Time, 8),
    def(FieldId::OleTime, SemanticGroup::Time, 8),
    def(FieldId::JavaTime, SemanticGroup::Time, 8),
    def(FieldId::MsDosTime, SemanticGroup::Time, 4),
    def(FieldId::MsCompoundTime, SemanticGroup::Time, 4),
    def(FieldId::SystemTime, SemanticGroup::Time, 16),
    def(FieldId::Guid, SemanticGroup::Misc, 16),
    def(FieldId::GuidEmbeddedTime, SemanticGroup::GuidTime, 16),
];

/// Window sizes the refresh reads, smallest first
pub const WIDTHS: [usize; 5] = [1, 2, 4, 8, 16];

impl FieldId {
    pub fn all() -> impl Iterator<Item = FieldId> {
        REGISTRY.iter().map(|d| d.id)
    }

    pub fn definition(&self) -> &'static FieldDefinition {
        // REGISTRY lists every variant in declaration order
        &REGISTRY[*self as usize]
    }

    pub fn width(&self) -> usize {
        self.definition().width
    }

    pub fn group(&self) -> SemanticGroup {
        self.definition().group
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldId::Binary => "binary",
            FieldId::Int8 => "int8",
            FieldId::UInt8 => "uint8",
            FieldId::Int16 => "int16",
            FieldId::UInt16 => "uint16",
            FieldId::Int32 => "int32",
            FieldId::UInt32 => "uint32",
            FieldId::Int64 => "int64",
            FieldId::UInt64 => "uint64",
            FieldId::Float => "float",
            FieldId::Double => "double",
            FieldId::Time32 => "time32",
            FieldId::Time64 => "time64",
            FieldId::FileTime => "filetime",
            FieldId::OleTime => "oletime",
            FieldId::JavaTime => "javatime",
            FieldId::MsDosTime => "msdostime",
            FieldId::MsCompoundTime => "udttm",
            FieldId::SystemTime => "systemtime",
            FieldId::Guid => "guid",
            FieldId::GuidEmbeddedTime => "guidtime",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Binary => "Binary",
            FieldId::Int8 => "Int8",
            FieldId::UInt8 => "UInt8",
            FieldId::Int16 => "Int16",
            FieldId::UInt16 => "UInt16",
            FieldId::Int32 => "Int32",
            FieldId::UInt32 => "UInt32",
            FieldId::Int64 => "Int64",
            FieldId::UInt64 => "UInt64",
            FieldId::Float => "Float",
            FieldId::Double => "Double",
            FieldId::Time32 => "time32_t",
            FieldId::Time64 => "time64_t",
            FieldId::FileTime => "FILETIME",
            FieldId::OleTime => "OLE time",
            FieldId::JavaTime => "Java time",
            FieldId::MsDosTime => "MS-DOS time",
            FieldId::MsCompoundTime => "MS UDTTM time",
            FieldId::SystemTime => "SYSTEMTIME",
            FieldId::Guid => "GUID",
            FieldId::GuidEmbeddedTime => "GUID v1 time",
        }
    }

    pub fn from_name(name: &str) -> Option<FieldId> {
        let name = name.to_ascii_lowercase();
        FieldId::all().find(|id| id.name() == name).or(match name.as_str() {
            "i8" => Some(FieldId::Int8),
            "u8" => Some(FieldId::UInt8),
            "i16" => Some(FieldId::Int16),
            "u16" => Some(FieldId::UInt16),
            "i32" => Some(FieldId::Int32),
            "u32" => Some(FieldId::UInt32),
            "i64" => Some(FieldId::Int64),
            "u64" => Some(FieldId::UInt64),
            "f32" => Some(FieldId::Float),
            "f64" => Some(FieldId::Double),
            "mscompoundtime" => Some(FieldId::MsCompoundTime),
            _ => None,
        })
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A window of `width` bytes at `offset` fits inside `data_len` bytes.
pub fn is_available(offset: u64, width: usize, data_len: u64) -> bool {
    u64::try_from(width)
        .ok()
        .and_then(|w| offset.checked_add(w))
        .is_some_and(|end| end <= data_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_declaration_order() {
        assert_eq!(REGISTRY.len(), 21);
        for (i, d) in REGISTRY.iter().enumerate() {
            assert_eq!(d.id as usize, i);
            assert!(WIDTHS.contains(&d.width));
        }
    }

    #[test]
    fn test_names_round_trip() {
        for id in FieldId::all() {
            assert_eq!(FieldId::from_name(id.name()), Some(id));
        }
        assert_eq!(FieldId::from_name("U32"), Some(FieldId::UInt32));
        assert_eq!(FieldId::from_name("bogus"), None);
    }

    #[test]
    fn test_widths() {
        assert_eq!(FieldId::Int16.width(), 2);
        assert_eq!(FieldId::MsCompoundTime.width(), 4);
        assert_eq!(FieldId::JavaTime.width(), 8);
        assert_eq!(FieldId::GuidEmbeddedTime.width(), 16);
        assert_eq!(FieldId::Guid.group(), SemanticGroup::Misc);
    }

    #[test]
    fn test_availability_gate() {
        assert!(!is_available(2, 2, 3));
        assert!(is_available(0, 2, 3));
        assert!(is_available(2, 1, 3));
        assert!(!is_available(0, 16, 15));
        assert!(is_available(0, 16, 16));
        assert!(!is_available(u64::MAX, 1, u64::MAX));
    }
}
