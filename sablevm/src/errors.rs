use thiserror::Error;

/// The errors the runtime reports at its boundary.
///
/// Lookup failures carry the name that missed; in-VM runtime errors
/// (class casts, null receivers, array bounds, explicit `throw`) are
/// [`VmError::Execution`] values carrying the Java-style error name.
#[derive(Debug, Clone, Error)]
pub enum VmError {
	#[error("class {0:?} not defined")]
	NoSuchClass(String),
	#[error("no such method: {0}")]
	NoSuchMethod(String),
	#[error("field {0:?} not found")]
	NoSuchField(String),
	#[error("register {0:?} not found")]
	NoSuchRegister(String),
	#[error("no executor for opcode {0:?}")]
	NoSuchOpcode(String),
	#[error("invalid opcode: {0:?}")]
	InvalidOpcode(String),
	#[error("unsupported operation: {0}")]
	Unsupported(String),
	#[error("{name}: {message}")]
	Execution { name: String, message: String },
}

impl VmError {
	pub fn execution(name: impl Into<String>, message: impl Into<String>) -> VmError {
		VmError::Execution { name: name.into(), message: message.into() }
	}

	/// The Java-style error name of an execution error.
	pub fn execution_name(&self) -> Option<&str> {
		match self {
			VmError::Execution { name, .. } => Some(name),
			_ => None,
		}
	}
}
