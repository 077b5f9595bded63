//! Interpretation session: the byte window at one offset shown through every
//! field, and single-field edits written back through the host.

use crate::buffer::ByteSource;
use crate::codec::{Codec, DecodedValue};
use crate::datefmt::FormatSpec;
use crate::error::{BufferError, EditError};
use crate::fields::{is_available, FieldId, SemanticGroup, REGISTRY, WIDTHS};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Shown for fields whose window runs past the end of the data
pub const UNAVAILABLE_PLACEHOLDER: &str = "0";

/// Largest width the Binary field can take
pub const MAX_BINARY_WIDTH: usize = 8;

/// Per-session settings handed to every codec call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpretationContext {
    pub offset: u64,
    pub data_len: u64,
    pub big_endian: bool,
    pub show_hex: bool,
    pub date_format: FormatSpec,
}

impl InterpretationContext {
    pub fn new(data_len: u64, date_format: FormatSpec) -> Self {
        Self {
            offset: 0,
            data_len,
            big_endian: false,
            show_hex: false,
            date_format,
        }
    }

    pub fn is_available(&self, width: usize) -> bool {
        is_available(self.offset, width, self.data_len)
    }
}

/// One field as the caller should show it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub label: &'static str,
    pub group: SemanticGroup,
    pub width: usize,
    pub display: String,
    pub available: bool,
    pub read_only: bool,
}

/// Display state of every field after a refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<FieldId, FieldView>,
}

impl Snapshot {
    fn unavailable(binary_width: usize) -> Self {
        let fields = REGISTRY
            .iter()
            .map(|def| {
                let view = FieldView {
                    label: def.id.label(),
                    group: def.group,
                    width: field_width(def.id, binary_width),
                    display: UNAVAILABLE_PLACEHOLDER.to_string(),
                    available: false,
                    read_only: true,
                };
                (def.id, view)
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldView> {
        self.fields.get(&id)
    }

    /// Display string of a field; every field is always present.
    pub fn display(&self, id: FieldId) -> &str {
        self.fields
            .get(&id)
            .map_or(UNAVAILABLE_PLACEHOLDER, |v| v.display.as_str())
    }

    pub fn is_available(&self, id: FieldId) -> bool {
        self.fields.get(&id).is_some_and(|v| v.available)
    }

    /// Fields in registry order
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldView)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }

    pub fn to_map(&self) -> BTreeMap<FieldId, String> {
        self.iter().map(|(id, v)| (id, v.display.clone())).collect()
    }
}

fn field_width(id: FieldId, binary_width: usize) -> usize {
    if id == FieldId::Binary {
        binary_width
    } else {
        id.width()
    }
}

/// Decode every field at `ctx.offset`. Windows are read smallest first and the
/// cascade stops at the first width that does not fit.
pub fn interpret<B: ByteSource + ?Sized>(source: &B, ctx: &InterpretationContext, binary_width: usize) -> Snapshot {
    let mut snapshot = Snapshot::unavailable(binary_width);
    let read_only = !source.is_mutable();

    for width in WIDTHS {
        if !ctx.is_available(width) {
            debug!(offset = ctx.offset, width, data_len = ctx.data_len, "window past end of data");
            break;
        }
        let window = match source.read_bytes(ctx.offset, width) {
            Ok(window) => window,
            Err(e) => {
                warn!(offset = ctx.offset, width, error = %e, "host read failed");
                break;
            }
        };

        for def in REGISTRY.iter().filter(|d| field_width(d.id, binary_width) == width) {
            let decoded = Codec::for_field(def.id, binary_width).decode(&window, ctx);
            if let DecodedValue::NotRepresentable = decoded {
                debug!(field = %def.id, "not representable");
            }
            if let Some(view) = snapshot.fields.get_mut(&def.id) {
                view.display = decoded.to_string();
                view.available = true;
                view.read_only = read_only;
            }
        }
    }

    snapshot
}

/// A live view over a host buffer
#[derive(Debug)]
pub struct Session<B: ByteSource> {
    source: B,
    ctx: InterpretationContext,
    binary_width: usize,
    snapshot: Snapshot,
}

impl<B: ByteSource> Session<B> {
    /// Open at offset 0 with the host's date format.
    pub fn new(source: B) -> Self {
        let ctx = InterpretationContext::new(source.data_len(), source.date_format());
        let mut session = Self {
            source,
            ctx,
            binary_width: 1,
            snapshot: Snapshot::default(),
        };
        session.refresh();
        session
    }

    pub fn context(&self) -> &InterpretationContext {
        &self.ctx
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn binary_width(&self) -> usize {
        self.binary_width
    }

    pub fn source(&self) -> &B {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut B {
        &mut self.source
    }

    /// Re-read the data length and recompute every field.
    pub fn refresh(&mut self) -> &Snapshot {
        self.ctx.data_len = self.source.data_len();
        if self.ctx.offset > self.ctx.data_len {
            self.ctx.offset = self.ctx.data_len;
        }
        self.snapshot = interpret(&self.source, &self.ctx, self.binary_width);
        &self.snapshot
    }

    pub fn set_offset(&mut self, offset: u64) -> Result<&Snapshot, BufferError> {
        let data_len = self.source.data_len();
        if offset > data_len {
            return Err(BufferError::OutOfBounds {
                offset,
                len: 0,
                data_len,
            });
        }
        self.ctx.offset = offset;
        Ok(self.refresh())
    }

    pub fn set_big_endian(&mut self, big_endian: bool) -> &Snapshot {
        self.ctx.big_endian = big_endian;
        self.refresh()
    }

    pub fn set_show_hex(&mut self, show_hex: bool) -> &Snapshot {
        self.ctx.show_hex = show_hex;
        self.refresh()
    }

    pub fn set_date_format(&mut self, spec: FormatSpec) -> &Snapshot {
        self.ctx.date_format = spec;
        self.refresh()
    }

    /// Make `id` the selected field. Binary takes over its width, up to 8 bytes.
    pub fn select_field(&mut self, id: FieldId) -> &Snapshot {
        if id != FieldId::Binary {
            self.binary_width = id.width().min(MAX_BINARY_WIDTH);
        }
        self.refresh()
    }

    /// Parse `input` for `id`, write the bytes at the current offset and
    /// refresh. On failure nothing is written and the display is unchanged.
    pub fn edit(&mut self, id: FieldId, input: &str) -> Result<&Snapshot, EditError> {
        match self.write_field(id, input) {
            Ok(len) => {
                info!(field = %id, offset = self.ctx.offset, len, "field written");
                Ok(self.refresh())
            }
            Err(e) => {
                warn!(field = %id, input, error = %e, "edit rejected");
                Err(e)
            }
        }
    }

    fn write_field(&mut self, id: FieldId, input: &str) -> Result<usize, EditError> {
        let offset = self.ctx.offset;
        let width = field_width(id, self.binary_width);
        if !is_available(offset, width, self.source.data_len()) {
            return Err(EditError::Unavailable { field: id, offset });
        }
        if !self.source.is_mutable() {
            return Err(EditError::ReadOnly);
        }

        let codec = Codec::for_field(id, self.binary_width);
        let existing = if codec.needs_existing() {
            self.source.read_bytes(offset, width)?
        } else {
            Vec::new()
        };
        let bytes = codec
            .encode(input, &self.ctx, &existing)
            .map_err(|source| EditError::Invalid { field: id, source })?;
        self.source.write_bytes(offset, &bytes)?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::codec::NOT_REPRESENTABLE;
    use crate::error::CodecError;

    fn session(data: &[u8]) -> Session<MemoryBuffer> {
        Session::new(MemoryBuffer::new(data.to_vec()))
    }

    #[test]
    fn test_uint32_little_endian_load() {
        let s = session(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(s.snapshot().display(FieldId::UInt32), "2018915346");
        assert_eq!(s.snapshot().display(FieldId::UInt8), "18");
        assert_eq!(s.snapshot().display(FieldId::UInt16), "13330");
        assert_eq!(s.snapshot().display(FieldId::Binary), "00010010");
    }

    #[test]
    fn test_big_endian_and_hex_toggles() {
        let mut s = session(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(s.set_big_endian(true).display(FieldId::UInt32), "305419896");
        assert_eq!(s.set_show_hex(true).display(FieldId::UInt32), "12345678");
        assert_eq!(s.snapshot().display(FieldId::Int8), "12");
        assert_eq!(s.set_big_endian(false).display(FieldId::UInt16), "3412");
    }

    #[test]
    fn test_edit_int16_leaves_rest_untouched() {
        let mut s = session(&[0x12, 0x34, 0x56, 0x78]);
        s.edit(FieldId::Int16, "-1").unwrap();
        assert_eq!(s.source().as_bytes(), &[0xFF, 0xFF, 0x56, 0x78]);
        assert_eq!(s.snapshot().display(FieldId::Int16), "-1");
        assert_eq!(s.snapshot().display(FieldId::UInt16), "65535");
    }

    #[test]
    fn test_cascade_stops_at_data_end() {
        let mut s = session(&[1, 2, 3]);
        s.set_offset(2).unwrap();
        let snap = s.snapshot();
        assert!(snap.is_available(FieldId::UInt8));
        for id in [FieldId::Int16, FieldId::UInt32, FieldId::Double, FieldId::Guid] {
            assert!(!snap.is_available(id), "{}", id);
            assert_eq!(snap.display(id), UNAVAILABLE_PLACEHOLDER);
            assert!(snap.get(id).unwrap().read_only);
        }

        s.set_offset(0).unwrap();
        assert!(s.snapshot().is_available(FieldId::Int16));
        assert!(!s.snapshot().is_available(FieldId::Int32));
    }

    #[test]
    fn test_empty_data_has_nothing_available() {
        let s = session(&[]);
        assert!(s.snapshot().iter().all(|(_, v)| !v.available));
    }

    #[test]
    fn test_offset_past_end_rejected() {
        let mut s = session(&[0; 4]);
        assert!(s.set_offset(5).is_err());
        assert!(s.set_offset(4).is_ok());
        assert_eq!(s.context().offset, 4);
    }

    #[test]
    fn test_edit_unavailable_field() {
        let mut s = session(&[0; 3]);
        s.set_offset(2).unwrap();
        let err = s.edit(FieldId::Int16, "1").unwrap_err();
        assert!(matches!(err, EditError::Unavailable { field: FieldId::Int16, offset: 2 }));
        assert_eq!(s.source().as_bytes(), &[0, 0, 0]);
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let mut s = session(&[0x12, 0x34, 0x56, 0x78]);
        let before = s.snapshot().clone();
        let err = s.edit(FieldId::UInt8, "300").unwrap_err();
        assert!(err.is_user_input());
        assert!(matches!(
            err,
            EditError::Invalid {
                source: CodecError::Format,
                ..
            }
        ));
        assert_eq!(s.snapshot(), &before);
        assert_eq!(s.source().as_bytes(), &[0x12, 0x34, 0x56, 0x78]);
        // Still usable afterwards
        s.edit(FieldId::UInt8, "1").unwrap();
        assert_eq!(s.source().as_bytes()[0], 1);
    }

    #[test]
    fn test_read_only_source() {
        let mut s = Session::new(MemoryBuffer::read_only(vec![0; 8]));
        assert!(s.snapshot().get(FieldId::Int8).unwrap().read_only);
        assert!(matches!(s.edit(FieldId::Int8, "1"), Err(EditError::ReadOnly)));
    }

    #[test]
    fn test_binary_follows_selection() {
        let mut s = session(&[0x01, 0x02, 0x03, 0x04, 0, 0, 0, 0]);
        assert_eq!(s.binary_width(), 1);
        s.select_field(FieldId::UInt16);
        assert_eq!(s.snapshot().display(FieldId::Binary), "00000010  00000001");
        s.select_field(FieldId::Guid);
        assert_eq!(s.binary_width(), 8);
        s.select_field(FieldId::Binary);
        assert_eq!(s.binary_width(), 8);

        // Binary re-gates with its width
        s.set_offset(4).unwrap();
        assert!(!s.snapshot().is_available(FieldId::Binary));
        s.select_field(FieldId::Int32);
        assert!(s.snapshot().is_available(FieldId::Binary));
        s.edit(FieldId::Binary, "11111111 00000000 00000000 00000001").unwrap();
        assert_eq!(&s.source().as_bytes()[4..], &[0x01, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_time_and_guid_fields() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(&(-1i32).to_le_bytes());
        let mut s = session(&data);
        assert_eq!(s.snapshot().display(FieldId::Time32), NOT_REPRESENTABLE);

        s.edit(FieldId::Guid, "{C232AB00-9414-11EC-B3C8-9F6BDECED846}").unwrap();
        assert_eq!(
            s.snapshot().display(FieldId::GuidEmbeddedTime),
            "02/22/2022 19:22:22.000"
        );
        s.edit(FieldId::GuidEmbeddedTime, "01/01/2001 00:00:00").unwrap();
        assert_eq!(
            s.snapshot().display(FieldId::GuidEmbeddedTime),
            "01/01/2001 00:00:00.000"
        );
        assert_eq!(&s.source().as_bytes()[8..], &[0xB3, 0xC8, 0x9F, 0x6B, 0xDE, 0xCE, 0xD8, 0x46]);

        s.edit(FieldId::Guid, "{9C7D1A2E-3F4B-4C5D-8E6F-A0B1C2D3E4F5}").unwrap();
        assert_eq!(s.snapshot().display(FieldId::GuidEmbeddedTime), NOT_REPRESENTABLE);
        let before = s.source().as_bytes().to_vec();
        assert!(s.edit(FieldId::GuidEmbeddedTime, "01/01/2001").is_err());
        assert_eq!(s.source().as_bytes(), before.as_slice());
    }

    #[test]
    fn test_date_format_change() {
        let mut s = session(&0i64.to_le_bytes());
        assert_eq!(s.snapshot().display(FieldId::JavaTime), "01/01/1970 00:00:00.000");
        s.set_date_format(FormatSpec::new(crate::datefmt::DateOrder::Ymd, '-'));
        assert_eq!(s.snapshot().display(FieldId::JavaTime), "1970-01-01 00:00:00.000");
        s.edit(FieldId::Time64, "2000-02-29 12:00").unwrap();
        assert_eq!(s.snapshot().display(FieldId::Time64), "2000-02-29 12:00:00.000");
    }

    #[test]
    fn test_interpret_is_stateless() {
        let buf = MemoryBuffer::new(vec![0x12, 0x34, 0x56, 0x78]);
        let mut ctx = InterpretationContext::new(4, FormatSpec::default());
        ctx.big_endian = true;
        let snap = interpret(&buf, &ctx, 4);
        assert_eq!(snap.display(FieldId::UInt32), "305419896");
        assert_eq!(snap.display(FieldId::Binary), "00010010  00110100  01010110  01111000");
        assert_eq!(snap.to_map().len(), REGISTRY.len());
    }
}
