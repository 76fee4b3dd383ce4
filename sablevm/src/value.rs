use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use sable::types::{Literal, Type};
use crate::errors::VmError;
use crate::lang::{SmaliClass, SmaliObject};

/// A runtime value held by registers, fields and arrays.
///
/// Characters are widened to strings and all integer widths share
/// [`Value::Int`]; the typed opcode variants only differ in the masking
/// they apply.
#[derive(Debug, Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Int(i64),
	Float(f64),
	Bool(bool),
	String(String),
	/// A type descriptor handle, e.g. from an annotation attribute.
	Type(Type),
	Class(Rc<SmaliClass>),
	Object(Rc<SmaliObject>),
	Array(Rc<RefCell<Vec<Value>>>),
}

impl Value {
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Bool(_) => "boolean",
			Value::String(_) => "string",
			Value::Type(_) => "type",
			Value::Class(_) => "class",
			Value::Object(_) => "object",
			Value::Array(_) => "array",
		}
	}

	/// The integer value, booleans included.
	pub fn as_int(&self) -> Result<i64, VmError> {
		match self {
			Value::Int(int) => Ok(*int),
			Value::Bool(bool) => Ok(i64::from(*bool)),
			other => Err(VmError::execution(
				"TypeError",
				format!("expected an integer value - got {}", other.type_name()),
			)),
		}
	}

	/// Numeric comparison with int/float promotion, plus string
	/// ordering. Mixed kinds do not compare.
	pub fn compare(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
			(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
			_ => {
				let a = self.as_number()?;
				let b = other.as_number()?;
				a.partial_cmp(&b)
			},
		}
	}

	fn as_number(&self) -> Option<f64> {
		match self {
			Value::Int(int) => Some(*int as f64),
			Value::Float(float) => Some(*float),
			Value::Bool(bool) => Some(f64::from(u8::from(*bool))),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Type(a), Value::Type(b)) => a == b,
			(Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
			(Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
			(Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
			(Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
			(Value::Int(a), Value::Bool(b)) | (Value::Bool(b), Value::Int(a)) => *a == i64::from(*b),
			(Value::Float(a), Value::Bool(b)) | (Value::Bool(b), Value::Float(a)) => *a == f64::from(u8::from(*b)),
			_ => false,
		}
	}
}

impl From<Literal> for Value {
	fn from(literal: Literal) -> Value {
		match literal {
			Literal::Int(int) => Value::Int(int),
			Literal::Float(float) => Value::Float(float),
			Literal::Bool(bool) => Value::Bool(bool),
			Literal::Char(char) => Value::String(char.to_string()),
			Literal::String(string) => Value::String(string),
			Literal::Type(ty) => Value::Type(ty),
		}
	}
}

impl From<&Literal> for Value {
	fn from(literal: &Literal) -> Value {
		literal.clone().into()
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Int(int) => write!(f, "{int}"),
			Value::Float(float) => write!(f, "{float}"),
			Value::Bool(bool) => write!(f, "{bool}"),
			Value::String(string) => f.write_str(string),
			Value::Type(ty) => f.write_str(&ty.descriptor()),
			Value::Class(class) => write!(f, "class {}", class.name()),
			Value::Object(object) => write!(f, "{}@{:x}", object.class().name(), Rc::as_ptr(object) as usize),
			Value::Array(array) => {
				f.write_str("[")?;
				for (index, value) in array.borrow().iter().enumerate() {
					if index > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{value}")?;
				}
				f.write_str("]")
			},
		}
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use std::cmp::Ordering;
	use super::Value;

	#[test]
	fn cross_type_equality() {
		assert_eq!(Value::Int(1), Value::Float(1.0));
		assert_eq!(Value::Bool(true), Value::Int(1));
		assert_eq!(Value::Bool(false), Value::Int(0));
		assert_ne!(Value::Null, Value::Int(0));
	}

	#[test]
	fn comparison() {
		assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
		assert_eq!(Value::Float(2.5).compare(&Value::Int(2)), Some(Ordering::Greater));
		assert_eq!(
			Value::String("a".to_owned()).compare(&Value::String("b".to_owned())),
			Some(Ordering::Less),
		);
		assert_eq!(Value::Null.compare(&Value::Int(0)), None);
	}
}
