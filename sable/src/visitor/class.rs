use anyhow::Result;
use crate::flags::AccessFlags;
use crate::types::{MethodSignature, Type};
use crate::visitor::annotation::AnnotationVisitor;
use crate::visitor::field::FieldVisitor;
use crate::visitor::method::MethodVisitor;

/// Visits a class scope.
pub trait ClassVisitor {
	type Annotation: AnnotationVisitor;
	type Field: FieldVisitor;
	type Method: MethodVisitor;
	/// The visitor type for nested `.class` scopes; commonly `Self`.
	type Inner: ClassVisitor;

	/// Called when the `.class` definition has been parsed. The name is
	/// a class type descriptor.
	fn visit_class(&mut self, _name: &Type, _access: AccessFlags) -> Result<()> {
		Ok(())
	}

	fn visit_super(&mut self, _super_class: &Type) -> Result<()> {
		Ok(())
	}

	fn visit_implements(&mut self, _interface: &Type) -> Result<()> {
		Ok(())
	}

	/// Called on a `.source` directive, quotes removed.
	fn visit_source(&mut self, _source: &str) -> Result<()> {
		Ok(())
	}

	/// Called on a `.debug` directive.
	fn visit_debug(&mut self, _enabled: bool) -> Result<()> {
		Ok(())
	}

	/// Called when a field definition has been parsed. A trailing
	/// assignment is handed over as the raw value token.
	fn visit_field(&mut self, _access: AccessFlags, _name: &str, _descriptor: &Type, _value: Option<&str>) -> Result<Option<Self::Field>> {
		Ok(None)
	}

	fn finish_field(&mut self, _field: Self::Field) -> Result<()> {
		Ok(())
	}

	fn visit_method(&mut self, _access: AccessFlags, _signature: &MethodSignature) -> Result<Option<Self::Method>> {
		Ok(None)
	}

	fn finish_method(&mut self, _method: Self::Method) -> Result<()> {
		Ok(())
	}

	fn visit_annotation(&mut self, _access: AccessFlags, _descriptor: &Type) -> Result<Option<Self::Annotation>> {
		Ok(None)
	}

	fn finish_annotation(&mut self, _annotation: Self::Annotation) -> Result<()> {
		Ok(())
	}

	/// Called when a nested `.class` definition has been parsed. All
	/// following input belongs to the inner class.
	fn visit_inner_class(&mut self, _name: &Type, _access: AccessFlags) -> Result<Option<Self::Inner>> {
		Ok(None)
	}

	fn finish_inner_class(&mut self, _inner: Self::Inner) -> Result<()> {
		Ok(())
	}

	fn visit_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	fn visit_eol_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	/// Called once the source is exhausted, on the deepest open class
	/// scope.
	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}
