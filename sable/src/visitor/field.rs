use anyhow::Result;
use crate::flags::AccessFlags;
use crate::types::Type;
use crate::visitor::annotation::AnnotationVisitor;

/// Visits the trailer of a `.field` definition.
///
/// A field scope is open until the next non-annotation directive, or an
/// explicit `.end field`.
pub trait FieldVisitor {
	type Annotation: AnnotationVisitor;

	fn visit_annotation(&mut self, _access: AccessFlags, _descriptor: &Type) -> Result<Option<Self::Annotation>> {
		Ok(None)
	}

	fn finish_annotation(&mut self, _annotation: Self::Annotation) -> Result<()> {
		Ok(())
	}

	fn visit_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	fn visit_eol_comment(&mut self, _text: &str) -> Result<()> {
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}
