//! Parsing, modeling and re-emission of Smali sources.
//!
//! The crate is organized around a visitor protocol: the
//! [`reader::SmaliReader`] consumes source text line by line and fires
//! events into implementations of the [`visitor`] traits. The
//! [`writer::SmaliWriter`] implements the same traits and prints
//! canonical Smali back out, so reader and writer compose into a
//! rewriting pipeline.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use sable::reader::SmaliReader;
//! use sable::writer::SmaliWriter;
//!
//! let source = "\
//! .class public Lcom/example/Hello;
//! .super Ljava/lang/Object;
//! ";
//!
//! let mut writer = SmaliWriter::new();
//! SmaliReader::new().visit(source, &mut writer).unwrap();
//! assert_eq!(writer.code(), source);
//! ```

pub mod flags;
pub mod line;
pub mod opcode;
pub mod reader;
pub mod types;
pub mod visitor;
pub mod writer;

pub use flags::AccessFlags;
pub use reader::{CopyHandler, ErrorMode, Scope, SmaliReader, SyntaxError};
pub use types::{is_type_descriptor, Literal, MethodSignature, Primitive, Type};
pub use writer::SmaliWriter;
