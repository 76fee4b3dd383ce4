//! Per-invocation execution state.
//!
//! A [`Frame`] is allocated for every call and shares the method's
//! [`CodeBody`] through an `Rc`, so nested and recursive invocations of
//! the same method never step on each other.

use std::collections::HashMap;
use std::rc::Rc;
use sable::types::{Literal, Type};
use crate::errors::VmError;
use crate::executor::Instruction;
use crate::value::Value;

/// A switch table payload, keyed by the label immediately preceding the
/// table directive.
#[derive(Debug, Clone)]
pub enum SwitchData {
	/// `.packed-switch`: consecutive cases starting at `base`.
	Packed { base: String, targets: Vec<String> },
	/// `.sparse-switch`: explicit `(case literal, target label)` pairs.
	Sparse(Vec<(String, String)>),
}

/// The compiled body of a method: the opcode list plus the label, catch,
/// array-data and switch tables collected at parse time.
#[derive(Debug, Default)]
pub struct CodeBody {
	pub(crate) opcodes: Vec<Instruction>,
	pub(crate) labels: HashMap<String, usize>,
	pub(crate) catches: HashMap<String, (Type, String)>,
	pub(crate) array_data: HashMap<String, Vec<Literal>>,
	pub(crate) switch_data: HashMap<String, SwitchData>,
}

impl CodeBody {
	pub fn opcodes(&self) -> &[Instruction] {
		&self.opcodes
	}

	pub fn label(&self, name: &str) -> Option<usize> {
		self.labels.get(name).copied()
	}

	/// The handler for a `:try_start` label, as `(exception, handler
	/// label)`.
	pub fn catch(&self, start: &str) -> Option<&(Type, String)> {
		self.catches.get(start)
	}

	pub fn array_data(&self, label: &str) -> Option<&[Literal]> {
		self.array_data.get(label).map(Vec::as_slice)
	}

	pub fn switch_data(&self, label: &str) -> Option<&SwitchData> {
		self.switch_data.get(label)
	}
}

/// The caller side of a nested invocation, for back-traces.
#[derive(Debug, Clone)]
pub struct CallerContext {
	pub method: String,
	pub pos: usize,
}

/// The execution state of one method invocation.
///
/// Registers named `pN` hold parameters (`p0` is the receiver of a
/// non-static method), `vN` hold locals. Reading a register that was
/// never written is an error; writing creates it.
#[derive(Debug)]
pub struct Frame {
	registers: HashMap<String, Value>,
	method: String,
	pub pos: usize,
	pub label: Option<String>,
	pub return_value: Value,
	/// The return value of the most recent sub-call, read by
	/// `move-result*`.
	pub method_return: Value,
	pub finished: bool,
	pub error: Option<VmError>,
	pub parent: Option<CallerContext>,
	code: Rc<CodeBody>,
}

impl Frame {
	pub fn new(method: impl Into<String>, code: Rc<CodeBody>) -> Frame {
		Frame {
			registers: HashMap::new(),
			method: method.into(),
			pos: 0,
			label: None,
			return_value: Value::Null,
			method_return: Value::Null,
			finished: false,
			error: None,
			parent: None,
			code,
		}
	}

	/// The qualified signature of the running method.
	pub fn method(&self) -> &str {
		&self.method
	}

	pub fn code(&self) -> &Rc<CodeBody> {
		&self.code
	}

	pub fn get(&self, register: &str) -> Result<Value, VmError> {
		self.registers.get(register)
			.cloned()
			.ok_or_else(|| VmError::NoSuchRegister(register.to_owned()))
	}

	pub fn set(&mut self, register: impl Into<String>, value: Value) {
		self.registers.insert(register.into(), value);
	}

	pub fn contains(&self, register: &str) -> bool {
		self.registers.contains_key(register)
	}

	pub fn register_names(&self) -> Vec<String> {
		self.registers.keys().cloned().collect()
	}

	/// Transfers control to a label.
	pub fn branch(&mut self, label: &str) -> Result<(), VmError> {
		let target = self.code.labels.get(label)
			.copied()
			.ok_or_else(|| VmError::execution("NoSuchLabelError", label))?;
		self.label = Some(label.to_owned());
		self.pos = target;
		Ok(())
	}
}
