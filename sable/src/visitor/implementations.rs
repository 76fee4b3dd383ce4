//! Visitor implementations for `()`: visit nothing, decline every scope.

use crate::visitor::annotation::AnnotationVisitor;
use crate::visitor::class::ClassVisitor;
use crate::visitor::field::FieldVisitor;
use crate::visitor::method::MethodVisitor;

impl AnnotationVisitor for () {
	type Sub = ();
}

impl FieldVisitor for () {
	type Annotation = ();
}

impl MethodVisitor for () {
	type Annotation = ();
}

impl ClassVisitor for () {
	type Annotation = ();
	type Field = ();
	type Method = ();
	type Inner = ();
}
