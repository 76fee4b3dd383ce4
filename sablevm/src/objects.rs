//! Native implementations for a handful of well known `java/lang`
//! classes, keyed by method signature.

use std::rc::Rc;
use crate::errors::VmError;
use crate::value::Value;
use crate::vm::SmaliVm;

pub type BuiltinFn = fn(&SmaliVm, &Value) -> Result<Value, VmError>;

/// The operation table of one built-in class.
pub struct BuiltinClass {
	pub name: &'static str,
	operations: &'static [(&'static str, BuiltinFn)],
}

impl BuiltinClass {
	pub fn get(&self, signature: &str) -> Option<BuiltinFn> {
		self.operations.iter()
			.find(|(name, _)| *name == signature)
			.map(|(_, operation)| *operation)
	}
}

static OBJECT: BuiltinClass = BuiltinClass {
	name: "Ljava/lang/Object;",
	operations: &[
		("toString()Ljava/lang/String;", object_to_string),
		("<init>()V", object_init),
		("hashCode()I", object_hash_code),
		("getClass()Ljava/lang/Class;", object_get_class),
	],
};

static CLASS: BuiltinClass = BuiltinClass {
	name: "Ljava/lang/Class;",
	operations: &[
		("getName()Ljava/lang/String;", class_get_name),
		("getSimpleName()Ljava/lang/String;", class_get_simple_name),
	],
};

static STRING: BuiltinClass = BuiltinClass {
	name: "Ljava/lang/String;",
	operations: &[
		("hashCode()I", string_hash_code),
	],
};

/// Looks up the built-in implementation for an owner descriptor.
pub fn builtin(descriptor: &str) -> Option<&'static BuiltinClass> {
	match descriptor {
		"Ljava/lang/Object;" => Some(&OBJECT),
		"Ljava/lang/Class;" => Some(&CLASS),
		"Ljava/lang/String;" => Some(&STRING),
		_ => None,
	}
}

fn object_to_string(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	Ok(Value::String(receiver.to_string()))
}

fn object_init(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	Ok(receiver.clone())
}

fn object_hash_code(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	let hash = match receiver {
		Value::Object(object) => Rc::as_ptr(object) as i64,
		Value::Array(array) => Rc::as_ptr(array) as i64,
		Value::Class(class) => Rc::as_ptr(class) as i64,
		Value::String(string) => java_string_hash(string),
		Value::Int(int) => *int,
		Value::Bool(bool) => i64::from(*bool),
		Value::Float(float) => float.to_bits() as i64,
		Value::Type(ty) => java_string_hash(&ty.descriptor()),
		Value::Null => 0,
	};
	Ok(Value::Int(hash))
}

fn object_get_class(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	match receiver {
		Value::Object(object) => Ok(Value::Class(object.class().clone())),
		Value::Class(class) => Ok(Value::Class(class.clone())),
		other => Err(VmError::execution(
			"TypeError",
			format!("getClass() needs an object receiver - got {}", other.type_name()),
		)),
	}
}

fn class_get_name(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	match receiver {
		Value::Class(class) => Ok(Value::String(class.name())),
		other => Err(VmError::execution(
			"TypeError",
			format!("expected a class receiver - got {}", other.type_name()),
		)),
	}
}

fn class_get_simple_name(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	match receiver {
		Value::Class(class) => Ok(Value::String(class.simple_name())),
		other => Err(VmError::execution(
			"TypeError",
			format!("expected a class receiver - got {}", other.type_name()),
		)),
	}
}

fn string_hash_code(_vm: &SmaliVm, receiver: &Value) -> Result<Value, VmError> {
	match receiver {
		Value::String(string) => Ok(Value::Int(java_string_hash(string))),
		other => Err(VmError::execution(
			"TypeError",
			format!("expected a string receiver - got {}", other.type_name()),
		)),
	}
}

/// `s[0]*31^(n-1) + s[1]*31^(n-2) + … + s[n-1]`, wrapped to a signed 32
/// bit integer over UTF-16 code units, like the Java implementation.
pub(crate) fn java_string_hash(text: &str) -> i64 {
	let mut hash: i32 = 0;
	for unit in text.encode_utf16() {
		hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
	}
	i64::from(hash)
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use super::java_string_hash;

	#[test]
	fn known_java_hashes() {
		assert_eq!(java_string_hash(""), 0);
		assert_eq!(java_string_hash("a"), 97);
		assert_eq!(java_string_hash("ab"), 3105);
		assert_eq!(java_string_hash("hello"), 99162322);
		// wraps to a negative signed 32 bit value
		assert_eq!(java_string_hash("polygenelubricants"), -2147483648);
	}
}
