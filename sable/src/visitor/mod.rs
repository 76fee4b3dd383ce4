//! The event interfaces the reader dispatches into.
//!
//! There is one trait per scope: [`ClassVisitor`], [`MethodVisitor`],
//! [`FieldVisitor`] and [`AnnotationVisitor`]. Every method has a no-op
//! default, so an implementation only overrides the events it cares
//! about.
//!
//! Methods opening a nested scope return `Result<Option<V>>`: `Some`
//! hands the reader a visitor for the scope, `None` declines it. A
//! declined scope is still parsed (the source may continue afterwards),
//! and its raw lines go to the copy handler if the reader has one. Once
//! a nested scope is over, the child visitor is handed back through the
//! matching `finish_*` method, after its `visit_end` has run.
//!
//! All four traits are implemented for `()`, which visits nothing.

mod implementations;

pub mod class;
pub mod field;
pub mod method;
pub mod annotation;

pub use annotation::AnnotationVisitor;
pub use class::ClassVisitor;
pub use field::FieldVisitor;
pub use method::MethodVisitor;
