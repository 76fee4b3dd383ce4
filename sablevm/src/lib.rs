//! A register machine executing parsed Smali classes in-process.
//!
//! The [`vm::SmaliVm`] drives the `sable` parser into a reflective class
//! model ([`lang`]), compiles method bodies into opcode lists
//! ([`frame::CodeBody`]) and runs them on per-call [`frame::Frame`]s
//! through the [`executor::OpcodeTable`].
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use sablevm::value::Value;
//! use sablevm::vm::SmaliVm;
//!
//! let source = "\
//! .class public Lcom/example/Math;
//! .super Ljava/lang/Object;
//!
//! .method public static answer()I
//!     .locals 1
//!     const/16 v0, 0x2a
//!     return v0
//! .end method
//! ";
//!
//! let vm = SmaliVm::new();
//! let class = vm.load_class(source, true, false).unwrap();
//! let method = class.method("answer()I").unwrap();
//! assert_eq!(vm.call(&method, None, &[]).unwrap(), Value::Int(42));
//! ```

pub mod errors;
pub mod executor;
pub mod frame;
pub mod lang;
pub mod objects;
pub mod value;
pub mod vm;

pub use errors::VmError;
pub use executor::{Opcode, OpcodeTable};
pub use frame::{CodeBody, Frame, SwitchData};
pub use lang::{AnnotationValue, Member, MethodBroker, SmaliAnnotation, SmaliClass, SmaliField, SmaliMethod, SmaliObject};
pub use value::Value;
pub use vm::{DebugHandler, SmaliVm};
