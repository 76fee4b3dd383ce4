use anyhow::Result;
use crate::flags::AccessFlags;
use crate::types::{Literal, Type};
use crate::visitor::annotation::AnnotationVisitor;

/// Visits the body of a `.method` scope.
///
/// Most instructions arrive through [`MethodVisitor::visit_instruction`];
/// `invoke-*`, `return-*` and `goto*` have their own events because their
/// operands have more structure.
pub trait MethodVisitor {
	type Annotation: AnnotationVisitor;

	/// Called on a `.param`/`.parameter` directive. The name may be
	/// empty.
	fn visit_param(&mut self, _register: &str, _name: &str) -> Result<()> {
		Ok(())
	}

	/// Called on a `.locals` directive: the number of local registers.
	fn visit_locals(&mut self, _count: usize) -> Result<()> {
		Ok(())
	}

	/// Called on a `.registers` directive: the total register count,
	/// including parameters and the receiver.
	fn visit_registers(&mut self, _count: usize) -> Result<()> {
		Ok(())
	}

	/// Called on a `.line` debug directive.
	fn visit_line(&mut self, _number: usize) -> Result<()> {
		Ok(())
	}

	fn visit_prologue(&mut self) -> Result<()> {
		Ok(())
	}

	/// Called on a `:label` line.
	fn visit_block(&mut self, _label: &str) -> Result<()> {
		Ok(())
	}

	/// Called for `goto`, `goto/16` and `goto/32`.
	fn visit_goto(&mut self, _label: &str) -> Result<()> {
		Ok(())
	}

	/// Called for the `invoke-*` family. `kind` is the part after the
	/// first `-` (`direct`, `virtual`, `static`, …), `method` the
	/// `name(parameters)return` part of the operand.
	fn visit_invoke(&mut self, _kind: &str, _registers: &[String], _owner: &Type, _method: &str) -> Result<()> {
		Ok(())
	}

	/// Called for the `return*` family. `kind` is empty for a plain
	/// `return`.
	fn visit_return(&mut self, _kind: &str, _args: &[String]) -> Result<()> {
		Ok(())
	}

	/// Called for every other instruction, arguments comma-split.
	fn visit_instruction(&mut self, _name: &str, _args: &[String]) -> Result<()> {
		Ok(())
	}

	/// Called on a `.catch` directive with the enclosing block labels.
	fn visit_catch(&mut self, _exception: &Type, _start: &str, _end: &str, _handler: &str) -> Result<()> {
		Ok(())
	}

	fn visit_catchall(&mut self, _start: &str, _end: &str, _handler: &str) -> Result<()> {
		Ok(())
	}

	/// Called after a `.packed-switch` table has been collected. The
	/// payload belongs to the label immediately preceding the directive.
	fn visit_packed_switch(&mut self, _base: &str, _targets: &[String]) -> Result<()> {
		Ok(())
	}

	/// Called after a `.sparse-switch` table has been collected, entries
	/// as `(case literal, target label)` pairs.
	fn visit_sparse_switch(&mut self, _branches: &[(String, String)]) -> Result<()> {
		Ok(())
	}

	/// Called after an `.array-data` block, values decoded.
	fn visit_array_data(&mut self, _width: &str, _values: &[Literal]) -> Result<()> {
		Ok(())
	}

	/// Local variable debug info from a `.local` directive.
	fn visit_local(&mut self, _register: &str, _name: &str, _descriptor: &str, _full_descriptor: Option<&str>) -> Result<()> {
		Ok(())
	}

	/// Called on a `.restart local` directive.
	fn visit_restart(&mut self, _register: &str) -> Result<()> {
		Ok(())
	}

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

	/// Called at the `.end method` line.
	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}
