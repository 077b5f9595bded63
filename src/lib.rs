//! Typed interpretation of binary data.
//!
//! A [`Session`] looks at the bytes of a [`ByteSource`] at one offset and shows
//! them as every supported type at once: integers, floats, binary digits,
//! seven timestamp encodings, `SYSTEMTIME`, GUIDs and GUID v1 timestamps. Any
//! one of those views can be edited and the bytes are written back.
//!
//! ```
//! use byteview::{FieldId, MemoryBuffer, Session};
//!
//! let mut session = Session::new(MemoryBuffer::new(vec![0x12, 0x34, 0x56, 0x78]));
//! assert_eq!(session.snapshot().display(FieldId::UInt32), "2018915346");
//!
//! session.edit(FieldId::Int16, "-1").unwrap();
//! assert_eq!(session.source().as_bytes(), &[0xFF, 0xFF, 0x56, 0x78]);
//! ```

pub mod bits;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod datefmt;
pub mod error;
pub mod fields;
pub mod guid;
pub mod logging;
pub mod numeric;
pub mod session;
pub mod time;

pub use buffer::{ByteSource, FileBuffer, MemoryBuffer};
pub use codec::{Codec, DecodedValue, NOT_REPRESENTABLE};
pub use datefmt::{CalendarTime, DateOrder, FormatSpec};
pub use error::{BufferError, CodecError, EditError};
pub use fields::{FieldDefinition, FieldId, SemanticGroup, REGISTRY};
pub use session::{interpret, FieldView, InterpretationContext, Session, Snapshot, UNAVAILABLE_PLACEHOLDER};
