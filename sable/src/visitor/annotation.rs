use anyhow::Result;
use crate::flags::AccessFlags;
use crate::types::Type;

/// Visits the attribute values of an annotation scope.
pub trait AnnotationVisitor {
	/// The visitor type for `.subannotation` scopes; commonly `Self`.
	type Sub: AnnotationVisitor;

	/// Visits a simple `name = value` attribute. The value is the raw
	/// token, use [`crate::types::Literal::parse`] to decode it.
	fn visit_value(&mut self, _name: &str, _value: &str) -> Result<()> {
		Ok(())
	}

	/// Visits a `name = { … }` attribute, values comma-trimmed.
	fn visit_array(&mut self, _name: &str, _values: &[String]) -> Result<()> {
		Ok(())
	}

	/// Visits a `name = .enum Lowner;->CONST:Ltype;` attribute.
	fn visit_enum(&mut self, _name: &str, _owner: &Type, _const_name: &str, _const_type: &Type) -> Result<()> {
		Ok(())
	}

	fn visit_subannotation(&mut self, _name: &str, _access: AccessFlags, _descriptor: &Type) -> Result<Option<Self::Sub>> {
		Ok(None)
	}

	fn finish_subannotation(&mut self, _name: &str, _sub: Self::Sub) -> Result<()> {
		Ok(())
	}

	fn visit_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	fn visit_eol_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	/// Called at the `.end annotation` / `.end subannotation` line.
	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}
