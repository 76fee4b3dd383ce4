//! The opcode dispatch table and the executor functions.
//!
//! Executors receive the VM, the current frame and the raw instruction
//! arguments. Each one registers under a primary opcode name plus the
//! alias spellings sharing its behavior (the typed `aget-byte`,
//! `sput-char`, … variants all fold onto the family executor).
//!
//! Arithmetic follows the host-language semantics of the register model:
//! integer division floors, `rem` takes the sign of the divisor, float
//! division is true division. Shift distances are masked to the register
//! width.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use sable::opcode;
use sable::types::{Literal, Type};
use crate::errors::VmError;
use crate::frame::{CallerContext, Frame, SwitchData};
use crate::lang::SmaliObject;
use crate::objects;
use crate::value::Value;
use crate::vm::SmaliVm;

pub type ExecutorFn = fn(&SmaliVm, &mut Frame, &[String]) -> Result<(), VmError>;

/// A registered executor.
#[derive(Debug, Copy, Clone)]
pub struct Opcode {
	name: &'static str,
	run: ExecutorFn,
}

impl Opcode {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn run(&self, vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
		(self.run)(vm, frame, args)
	}
}

pub(crate) const NOP: Opcode = Opcode { name: opcode::NOP, run: nop };

/// The immutable opcode name to executor mapping. Built once, owned by
/// the VM.
#[derive(Debug, Clone, Default)]
pub struct OpcodeTable {
	map: HashMap<&'static str, Opcode>,
}

impl OpcodeTable {
	/// An empty table; every opcode resolution will miss.
	pub fn empty() -> OpcodeTable {
		OpcodeTable::default()
	}

	/// Registers an executor under its primary name and all aliases.
	pub fn register(&mut self, name: &'static str, aliases: &[&'static str], run: ExecutorFn) {
		let opcode = Opcode { name, run };
		self.map.insert(name, opcode);
		for alias in aliases {
			self.map.insert(alias, opcode);
		}
	}

	pub fn get(&self, name: &str) -> Option<Opcode> {
		self.map.get(name).copied()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.map.contains_key(name)
	}

	/// The catch-all executor registered under `*`, if any.
	pub fn wildcard(&self) -> Option<Opcode> {
		self.get("*")
	}

	/// The standard DEX opcode families.
	pub fn standard() -> OpcodeTable {
		let mut table = OpcodeTable::empty();

		table.register(opcode::NOP, &[], nop);

		table.register(opcode::RETURN_VOID, &[opcode::RETURN_VOID_BARRIER, opcode::RETURN_VOID_NO_BARRIER], return_void);
		table.register(opcode::RETURN, &[opcode::RETURN_WIDE, opcode::RETURN_OBJECT], return_value);
		table.register(opcode::GOTO, &[opcode::GOTO_16, opcode::GOTO_32], goto);
		table.register(opcode::INVOKE, &["invoke-direct", "invoke-static", "invoke-virtual", "invoke-super", "invoke-interface"], invoke);
		table.register(opcode::THROW, &[], throw);

		table.register(opcode::CONST, &[
			opcode::CONST_4, opcode::CONST_16, opcode::CONST_HIGH16,
			opcode::CONST_WIDE, opcode::CONST_WIDE_16, opcode::CONST_WIDE_32, opcode::CONST_WIDE_HIGH16,
			opcode::CONST_STRING, opcode::CONST_STRING_JUMBO,
		], const_value);
		table.register(opcode::CONST_CLASS, &[], const_class);

		table.register(opcode::MOVE, &[
			opcode::MOVE_16, opcode::MOVE_FROM16,
			opcode::MOVE_WIDE, opcode::MOVE_WIDE_16, opcode::MOVE_WIDE_FROM16,
			opcode::MOVE_OBJECT, opcode::MOVE_OBJECT_16, opcode::MOVE_OBJECT_FROM16,
		], move_value);
		table.register(opcode::MOVE_RESULT, &[opcode::MOVE_RESULT_WIDE, opcode::MOVE_RESULT_OBJECT], move_result);
		table.register(opcode::MOVE_EXCEPTION, &[], move_exception);

		table.register(opcode::NEW_INSTANCE, &[], new_instance);
		table.register(opcode::NEW_ARRAY, &[], new_array);
		table.register(opcode::CHECK_CAST, &[opcode::INSTANCE_OF], check_cast);

		table.register(opcode::SGET, &[
			opcode::SGET_WIDE, opcode::SGET_OBJECT, opcode::SGET_BOOLEAN,
			opcode::SGET_BYTE, opcode::SGET_CHAR, opcode::SGET_SHORT,
		], sget);
		table.register(opcode::SPUT, &[
			opcode::SPUT_WIDE, opcode::SPUT_OBJECT, opcode::SPUT_BOOLEAN,
			opcode::SPUT_BYTE, opcode::SPUT_CHAR, opcode::SPUT_SHORT,
		], sput);
		table.register(opcode::IGET, &[
			opcode::IGET_WIDE, opcode::IGET_OBJECT, opcode::IGET_BOOLEAN,
			opcode::IGET_BYTE, opcode::IGET_CHAR, opcode::IGET_SHORT,
		], iget);
		table.register(opcode::IPUT, &[
			opcode::IPUT_WIDE, opcode::IPUT_OBJECT, opcode::IPUT_BOOLEAN,
			opcode::IPUT_BYTE, opcode::IPUT_CHAR, opcode::IPUT_SHORT,
		], iput);

		table.register(opcode::ARRAY_LENGTH, &[], array_length);
		table.register(opcode::FILL_ARRAY_DATA, &[], fill_array_data);
		table.register(opcode::AGET, &[
			opcode::AGET_WIDE, opcode::AGET_OBJECT, opcode::AGET_BOOLEAN,
			opcode::AGET_BYTE, opcode::AGET_CHAR, opcode::AGET_SHORT,
		], aget);
		table.register(opcode::APUT, &[
			opcode::APUT_WIDE, opcode::APUT_OBJECT, opcode::APUT_BOOLEAN,
			opcode::APUT_BYTE, opcode::APUT_CHAR, opcode::APUT_SHORT,
		], aput);

		table.register(opcode::PACKED_SWITCH, &[], packed_switch);
		table.register(opcode::SPARSE_SWITCH, &[], sparse_switch);

		table.register(opcode::IF_EQ, &[], if_eq);
		table.register(opcode::IF_NE, &[], if_ne);
		table.register(opcode::IF_LT, &[], if_lt);
		table.register(opcode::IF_LE, &[], if_le);
		table.register(opcode::IF_GT, &[], if_gt);
		table.register(opcode::IF_GE, &[], if_ge);
		table.register(opcode::IF_EQZ, &[], if_eqz);
		table.register(opcode::IF_NEZ, &[], if_nez);
		table.register(opcode::IF_LTZ, &[], if_ltz);
		table.register(opcode::IF_LEZ, &[], if_lez);
		table.register(opcode::IF_GTZ, &[], if_gtz);
		table.register(opcode::IF_GEZ, &[], if_gez);

		table.register(opcode::NEG_INT, &[opcode::NEG_LONG, opcode::NEG_FLOAT, opcode::NEG_DOUBLE], neg);
		table.register(opcode::NOT_INT, &[opcode::NOT_LONG], not);

		table.register(opcode::INT_TO_LONG, &[], int_to_long);
		table.register(opcode::LONG_TO_INT, &[], long_to_int);
		table.register(opcode::INT_TO_CHAR, &[opcode::INT_TO_SHORT], int_to_char);
		table.register(opcode::INT_TO_BYTE, &[], int_to_byte);
		table.register(opcode::INT_TO_FLOAT, &[opcode::INT_TO_DOUBLE], int_to_float);

		table.register(opcode::ADD_INT, &[opcode::ADD_LONG, opcode::ADD_FLOAT, opcode::ADD_DOUBLE], add);
		table.register(opcode::SUB_INT, &[opcode::SUB_LONG, opcode::SUB_FLOAT, opcode::SUB_DOUBLE], sub);
		table.register(opcode::MUL_INT, &[opcode::MUL_LONG, opcode::MUL_FLOAT, opcode::MUL_DOUBLE], mul);
		table.register(opcode::DIV_INT, &[opcode::DIV_LONG], div_int);
		table.register(opcode::DIV_FLOAT, &[opcode::DIV_DOUBLE], div_float);
		table.register(opcode::REM_INT, &[opcode::REM_LONG, opcode::REM_FLOAT, opcode::REM_DOUBLE], rem);
		table.register(opcode::AND_INT, &[opcode::AND_LONG], and);
		table.register(opcode::OR_INT, &[opcode::OR_LONG], or);
		table.register(opcode::XOR_INT, &[opcode::XOR_LONG], xor);
		table.register(opcode::SHL_INT, &[opcode::SHL_LONG], shl);
		table.register(opcode::SHR_INT, &[opcode::SHR_LONG], shr);
		table.register(opcode::USHR_INT, &[opcode::USHR_LONG], ushr);

		table.register(opcode::ADD_INT_2ADDR, &[opcode::ADD_LONG_2ADDR, opcode::ADD_FLOAT_2ADDR, opcode::ADD_DOUBLE_2ADDR], add_two_addr);
		table.register(opcode::SUB_INT_2ADDR, &[opcode::SUB_LONG_2ADDR, opcode::SUB_FLOAT_2ADDR, opcode::SUB_DOUBLE_2ADDR], sub_two_addr);
		table.register(opcode::MUL_INT_2ADDR, &[opcode::MUL_LONG_2ADDR, opcode::MUL_FLOAT_2ADDR, opcode::MUL_DOUBLE_2ADDR], mul_two_addr);
		table.register(opcode::DIV_INT_2ADDR, &[opcode::DIV_LONG_2ADDR], div_int_two_addr);
		table.register(opcode::DIV_FLOAT_2ADDR, &[opcode::DIV_DOUBLE_2ADDR], div_float_two_addr);
		table.register(opcode::REM_INT_2ADDR, &[opcode::REM_LONG_2ADDR, opcode::REM_FLOAT_2ADDR, opcode::REM_DOUBLE_2ADDR], rem_two_addr);
		table.register(opcode::AND_INT_2ADDR, &[opcode::AND_LONG_2ADDR], and_two_addr);
		table.register(opcode::OR_INT_2ADDR, &[opcode::OR_LONG_2ADDR], or_two_addr);
		table.register(opcode::XOR_INT_2ADDR, &[opcode::XOR_LONG_2ADDR], xor_two_addr);
		table.register(opcode::SHL_INT_2ADDR, &[opcode::SHL_LONG_2ADDR], shl_two_addr);
		table.register(opcode::SHR_INT_2ADDR, &[opcode::SHR_LONG_2ADDR], shr_two_addr);
		table.register(opcode::USHR_INT_2ADDR, &[opcode::USHR_LONG_2ADDR], ushr_two_addr);

		table.register(opcode::ADD_INT_LIT8, &[], add_lit8);
		table.register(opcode::ADD_INT_LIT16, &[], add_lit16);
		table.register(opcode::RSUB_INT, &[], rsub_lit16);
		table.register(opcode::RSUB_INT_LIT8, &[], rsub_lit8);
		table.register(opcode::MUL_INT_LIT8, &[], mul_lit8);
		table.register(opcode::MUL_INT_LIT16, &[], mul_lit16);
		table.register(opcode::DIV_INT_LIT8, &[], div_lit8);
		table.register(opcode::DIV_INT_LIT16, &[], div_lit16);
		table.register(opcode::REM_INT_LIT8, &[], rem_lit8);
		table.register(opcode::REM_INT_LIT16, &[], rem_lit16);
		table.register(opcode::AND_INT_LIT8, &[], and_lit8);
		table.register(opcode::AND_INT_LIT16, &[], and_lit16);
		table.register(opcode::OR_INT_LIT8, &[], or_lit8);
		table.register(opcode::OR_INT_LIT16, &[], or_lit16);
		table.register(opcode::XOR_INT_LIT8, &[], xor_lit8);
		table.register(opcode::XOR_INT_LIT16, &[], xor_lit16);
		table.register(opcode::SHL_INT_LIT8, &[], shl_lit8);
		table.register(opcode::SHR_INT_LIT8, &[], shr_lit8);
		table.register(opcode::USHR_INT_LIT8, &[], ushr_lit8);

		table
	}
}

/// One entry of a compiled opcode list: the resolved executor plus the
/// raw argument tokens.
#[derive(Debug, Clone)]
pub struct Instruction {
	pub opcode: Opcode,
	pub args: Vec<String>,
}

fn arg<'a>(args: &'a [String], index: usize) -> Result<&'a str, VmError> {
	args.get(index)
		.map(String::as_str)
		.ok_or_else(|| VmError::execution("ArgumentError", format!("missing instruction argument {index}")))
}

fn label_arg(args: &[String], index: usize) -> Result<&str, VmError> {
	Ok(arg(args, index)?.trim_start_matches(':'))
}

fn parse_int_literal(text: &str) -> Result<i64, VmError> {
	match Literal::parse(text) {
		Ok(Literal::Int(int)) => Ok(int),
		Ok(other) => Err(VmError::execution("TypeError", format!("expected an integer literal - got {other}"))),
		Err(e) => Err(VmError::execution("ValueError", e.to_string())),
	}
}

fn object_value(value: Value) -> Result<Rc<SmaliObject>, VmError> {
	match value {
		Value::Object(object) => Ok(object),
		other => Err(VmError::execution(
			"ClassCastError",
			format!("could not cast '{}' to an object", other.type_name()),
		)),
	}
}

fn array_value(value: &Value) -> Result<Rc<RefCell<Vec<Value>>>, VmError> {
	match value {
		Value::Array(array) => Ok(array.clone()),
		other => Err(VmError::execution(
			"ClassCastError",
			format!("could not cast '{}' to an array", other.type_name()),
		)),
	}
}

/// Splits a `Lowner;->name:type` field operand.
fn field_target(operand: &str) -> Result<(&str, &str), VmError> {
	let (owner, name_type) = operand.split_once("->")
		.ok_or_else(|| VmError::execution("TypeError", format!("expected 'Lowner;->name:type' - got {operand:?}")))?;
	let (name, _) = name_type.split_once(':')
		.ok_or_else(|| VmError::execution("TypeError", format!("expected 'name:type' - got {name_type:?}")))?;
	Ok((owner, name))
}

// ---------------------------------------------------------------------
// numeric helpers
// ---------------------------------------------------------------------

enum NumericPair {
	Ints(i64, i64),
	Floats(f64, f64),
}

fn int_of(value: &Value) -> Option<i64> {
	match value {
		Value::Int(int) => Some(*int),
		Value::Bool(bool) => Some(i64::from(*bool)),
		_ => None,
	}
}

fn float_of(value: &Value) -> Option<f64> {
	match value {
		Value::Float(float) => Some(*float),
		Value::Int(int) => Some(*int as f64),
		Value::Bool(bool) => Some(f64::from(u8::from(*bool))),
		_ => None,
	}
}

/// Both operands as integers, or both as floats when either side is one.
fn numeric_pair(a: &Value, b: &Value) -> Result<NumericPair, VmError> {
	if let (Some(left), Some(right)) = (int_of(a), int_of(b)) {
		return Ok(NumericPair::Ints(left, right));
	}
	match (float_of(a), float_of(b)) {
		(Some(left), Some(right)) => Ok(NumericPair::Floats(left, right)),
		_ => Err(VmError::execution(
			"TypeError",
			format!("unsupported operand types: {} and {}", a.type_name(), b.type_name()),
		)),
	}
}

fn int_pair(a: &Value, b: &Value) -> Result<(i64, i64), VmError> {
	Ok((a.as_int()?, b.as_int()?))
}

fn floor_div(a: i64, b: i64) -> i64 {
	let quotient = a.wrapping_div(b);
	if a % b != 0 && (a < 0) != (b < 0) {
		quotient - 1
	} else {
		quotient
	}
}

fn floor_rem(a: i64, b: i64) -> i64 {
	let remainder = a % b;
	if remainder != 0 && (remainder < 0) != (b < 0) {
		remainder + b
	} else {
		remainder
	}
}

fn val_add(a: &Value, b: &Value) -> Result<Value, VmError> {
	Ok(match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => Value::Int(a.wrapping_add(b)),
		NumericPair::Floats(a, b) => Value::Float(a + b),
	})
}

fn val_sub(a: &Value, b: &Value) -> Result<Value, VmError> {
	Ok(match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => Value::Int(a.wrapping_sub(b)),
		NumericPair::Floats(a, b) => Value::Float(a - b),
	})
}

fn val_mul(a: &Value, b: &Value) -> Result<Value, VmError> {
	Ok(match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => Value::Int(a.wrapping_mul(b)),
		NumericPair::Floats(a, b) => Value::Float(a * b),
	})
}

fn division_by_zero() -> VmError {
	VmError::execution("ArithmeticError", "division by zero")
}

/// Flooring division, both for ints and floats.
fn val_floor_div(a: &Value, b: &Value) -> Result<Value, VmError> {
	Ok(match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => {
			if b == 0 {
				return Err(division_by_zero());
			}
			Value::Int(floor_div(a, b))
		},
		NumericPair::Floats(a, b) => {
			if b == 0.0 {
				return Err(division_by_zero());
			}
			Value::Float((a / b).floor())
		},
	})
}

/// True division; always produces a float.
fn val_true_div(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => (a as f64, b as f64),
		NumericPair::Floats(a, b) => (a, b),
	};
	if b == 0.0 {
		return Err(division_by_zero());
	}
	Ok(Value::Float(a / b))
}

/// Remainder taking the sign of the divisor.
fn val_rem(a: &Value, b: &Value) -> Result<Value, VmError> {
	Ok(match numeric_pair(a, b)? {
		NumericPair::Ints(a, b) => {
			if b == 0 {
				return Err(division_by_zero());
			}
			Value::Int(floor_rem(a, b))
		},
		NumericPair::Floats(a, b) => {
			if b == 0.0 {
				return Err(division_by_zero());
			}
			Value::Float(a - b * (a / b).floor())
		},
	})
}

fn val_and(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(a & b))
}

fn val_or(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(a | b))
}

fn val_xor(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(a ^ b))
}

fn val_shl(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(a.wrapping_shl(b as u32)))
}

fn val_shr(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(a.wrapping_shr(b as u32)))
}

fn val_ushr(a: &Value, b: &Value) -> Result<Value, VmError> {
	let (a, b) = int_pair(a, b)?;
	Ok(Value::Int(((a as u64) >> (b as u64 & 63)) as i64))
}

/// Reverse subtraction for the `rsub-int` forms: `literal - register`.
fn val_rsub(a: &Value, b: &Value) -> Result<Value, VmError> {
	val_sub(b, a)
}

// ---------------------------------------------------------------------
// shared executor bodies
// ---------------------------------------------------------------------

type BinaryOp = fn(&Value, &Value) -> Result<Value, VmError>;

fn binary(frame: &mut Frame, args: &[String], op: BinaryOp) -> Result<(), VmError> {
	let left = frame.get(arg(args, 1)?)?;
	let right = frame.get(arg(args, 2)?)?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, op(&left, &right)?);
	Ok(())
}

fn binary_two_addr(frame: &mut Frame, args: &[String], op: BinaryOp) -> Result<(), VmError> {
	let left = frame.get(arg(args, 0)?)?;
	let right = frame.get(arg(args, 1)?)?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, op(&left, &right)?);
	Ok(())
}

fn binary_literal(frame: &mut Frame, args: &[String], mask: i64, op: BinaryOp) -> Result<(), VmError> {
	let left = frame.get(arg(args, 1)?)?;
	let literal = parse_int_literal(arg(args, 2)?)? & mask;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, op(&left, &Value::Int(literal))?);
	Ok(())
}

fn ordering(a: &Value, b: &Value) -> Result<Ordering, VmError> {
	a.compare(b).ok_or_else(|| VmError::execution(
		"TypeError",
		format!("cannot compare {} and {}", a.type_name(), b.type_name()),
	))
}

fn branch_if(frame: &mut Frame, args: &[String], label_index: usize, taken: bool) -> Result<(), VmError> {
	if taken {
		let label = label_arg(args, label_index)?.to_owned();
		frame.branch(&label)?;
	}
	Ok(())
}

// ---------------------------------------------------------------------
// executors
// ---------------------------------------------------------------------

fn nop(_vm: &SmaliVm, _frame: &mut Frame, _args: &[String]) -> Result<(), VmError> {
	Ok(())
}

fn return_void(_vm: &SmaliVm, frame: &mut Frame, _args: &[String]) -> Result<(), VmError> {
	frame.return_value = Value::Null;
	frame.finished = true;
	Ok(())
}

fn return_value(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	frame.return_value = frame.get(arg(args, 0)?)?;
	frame.finished = true;
	Ok(())
}

fn goto(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let label = label_arg(args, 0)?.to_owned();
	frame.branch(&label)
}

fn throw(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	frame.error = Some(VmError::execution("RuntimeError", value.to_string()));
	Ok(())
}

/// `invoke-*`: built-in owners dispatch natively, everything else
/// resolves through the registry and runs recursively. The callee's
/// return value lands in `method_return`.
fn invoke(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let kind = arg(args, 0)?;
	let owner = arg(args, 1)?;
	let method = arg(args, 2)?;
	let registers = args.get(3..).unwrap_or(&[]);

	let kind = kind.strip_suffix("/range").unwrap_or(kind);
	if !matches!(kind, "direct" | "virtual" | "static" | "super" | "interface") {
		return Err(VmError::execution("UnsupportedInvoke", format!("invoke kind {kind:?}")));
	}

	if let Some(builtin) = objects::builtin(owner) {
		let receiver = frame.get(arg(args, 3)?)?;
		let operation = builtin.get(method)
			.ok_or_else(|| VmError::NoSuchMethod(format!("method {method:?} not defined for {owner}")))?;
		frame.method_return = operation(vm, &receiver)?;
		return Ok(());
	}

	let mut values = Vec::with_capacity(registers.len());
	for register in registers {
		values.push(frame.get(register)?);
	}

	let (receiver, arguments) = if kind == "static" {
		(None, values.as_slice())
	} else {
		if values.is_empty() {
			return Err(VmError::execution("ArgumentError", "missing receiver register"));
		}
		(Some(values[0].clone()), &values[1..])
	};

	let class = vm.get_class(owner)?;
	let target = class.method(method)?;
	let parent = CallerContext {
		method: frame.method().to_owned(),
		pos: frame.pos,
	};
	frame.method_return = vm.call_from(&target, receiver, arguments, Some(parent))?;
	Ok(())
}

fn const_value(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let literal = Literal::parse(arg(args, 1)?)
		.map_err(|e| VmError::execution("ValueError", e.to_string()))?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, literal.into());
	Ok(())
}

fn const_class(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let class = vm.get_class(arg(args, 1)?)?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Class(class));
	Ok(())
}

fn move_value(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

fn move_result(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.method_return.clone();
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

fn move_exception(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = match &frame.error {
		Some(error) => Value::String(error.to_string()),
		None => Value::Null,
	};
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

/// Zero values for primitives and the well known wrapper classes, which
/// `new-instance` quietly coerces instead of allocating.
fn well_known_zero(descriptor: &str) -> Option<Value> {
	match descriptor {
		"I" | "S" | "B" | "J"
		| "Ljava/lang/Integer;" | "Ljava/lang/Byte;" | "Ljava/lang/Long;" | "Ljava/lang/Short;" => Some(Value::Int(0)),
		"F" | "D" => Some(Value::Float(0.0)),
		"Ljava/lang/String;" | "C" | "Ljava/lang/Character;" => Some(Value::String(String::new())),
		"Z" | "Ljava/lang/Boolean;" => Some(Value::Bool(false)),
		"Ljava/util/ArrayList;" | "Ljava/util/LinkedList;" => Some(Value::Array(Rc::new(RefCell::new(Vec::new())))),
		_ => None,
	}
}

fn new_instance(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let descriptor = arg(args, 1)?;
	let value = match well_known_zero(descriptor) {
		Some(value) => value,
		None => {
			let class = vm.get_class(descriptor)?;
			let object = Rc::new(SmaliObject::new(&class)?);
			SmaliObject::init(&object, vm, &[])?;
			Value::Object(object)
		},
	};
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

fn new_array(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let count = frame.get(arg(args, 1)?)?.as_int()?;
	if count < 0 {
		return Err(VmError::execution("NegativeArraySizeError", count.to_string()));
	}

	let element = Type::parse(arg(args, 2)?)
		.ok()
		.and_then(|ty| ty.array_type());
	let zero = match element.map(|ty| ty.descriptor()).as_deref() {
		Some("B" | "S" | "I" | "J") => Value::Int(0),
		Some("F" | "D") => Value::Float(0.0),
		_ => Value::Null,
	};

	let values = vec![zero; count as usize];
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Array(Rc::new(RefCell::new(values))));
	Ok(())
}

fn check_cast(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	let Value::Object(object) = value else {
		// non-objects pass the check silently
		return Ok(());
	};
	let target = vm.get_class(arg(args, 1)?)?;
	if !target.is_assignable(object.class(), vm) {
		return Err(VmError::execution(
			"ClassCastError",
			format!("could not cast {} to {}", object.class().name(), target.name()),
		));
	}
	Ok(())
}

fn sput(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	let (owner, name) = field_target(arg(args, 1)?)?;
	vm.get_class(owner)?.field(name)?.set_value(value);
	Ok(())
}

fn sget(vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let (owner, name) = field_target(arg(args, 1)?)?;
	let value = vm.get_class(owner)?.field(name)?.value();
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

fn iget(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let object = object_value(frame.get(arg(args, 1)?)?)?;
	let (_, name) = field_target(arg(args, 2)?)?;
	let value = object.get(name)?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

fn iput(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	let object = object_value(frame.get(arg(args, 1)?)?)?;
	let (_, name) = field_target(arg(args, 2)?)?;
	object.set(name, value)
}

fn array_length(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?;
	let length = match &value {
		Value::Array(array) => array.borrow().len(),
		Value::String(string) => string.chars().count(),
		other => return Err(VmError::execution(
			"TypeError",
			format!("{} has no length", other.type_name()),
		)),
	};
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int(length as i64));
	Ok(())
}

fn fill_array_data(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let label = label_arg(args, 1)?.to_owned();
	let values: Vec<Value> = frame.code()
		.array_data(&label)
		.ok_or_else(|| VmError::execution("NoSuchLabelError", label.clone()))?
		.iter()
		.map(Value::from)
		.collect();
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Array(Rc::new(RefCell::new(values))));
	Ok(())
}

fn out_of_bounds(index: i64, length: usize) -> VmError {
	VmError::execution(
		"IndexOutOfBoundsError",
		format!("index {index} is out of bounds for length {length}"),
	)
}

fn aget(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let array = array_value(&frame.get(arg(args, 1)?)?)?;
	let index = frame.get(arg(args, 2)?)?.as_int()?;
	let array = array.borrow();
	if index < 0 || index as usize >= array.len() {
		return Err(out_of_bounds(index, array.len()));
	}
	let value = array[index as usize].clone();
	drop(array);
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, value);
	Ok(())
}

/// `aput` appends when the index equals the length, otherwise replaces.
fn aput(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	let array = array_value(&frame.get(arg(args, 1)?)?)?;
	let index = frame.get(arg(args, 2)?)?.as_int()?;
	let mut array = array.borrow_mut();
	if index < 0 || index as usize > array.len() {
		return Err(out_of_bounds(index, array.len()));
	}
	if index as usize == array.len() {
		array.push(value);
	} else {
		array[index as usize] = value;
	}
	Ok(())
}

fn packed_switch(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?.as_int()?;
	let label = label_arg(args, 1)?.to_owned();
	let (base, targets) = match frame.code().switch_data(&label) {
		Some(SwitchData::Packed { base, targets }) => (base.clone(), targets.clone()),
		Some(SwitchData::Sparse(_)) => {
			return Err(VmError::execution("TypeError", format!("{label:?} is not a packed-switch table")));
		},
		None => return Err(VmError::execution("NoSuchLabelError", label)),
	};

	let index = value - parse_int_literal(&base)?;
	if index >= 0 && (index as usize) < targets.len() {
		frame.branch(&targets[index as usize])?;
	}
	Ok(())
}

fn sparse_switch(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 0)?)?;
	let label = label_arg(args, 1)?.to_owned();
	let branches = match frame.code().switch_data(&label) {
		Some(SwitchData::Sparse(branches)) => branches.clone(),
		Some(SwitchData::Packed { .. }) => {
			return Err(VmError::execution("TypeError", format!("{label:?} is not a sparse-switch table")));
		},
		None => return Err(VmError::execution("NoSuchLabelError", label)),
	};

	for (case, target) in branches {
		let case = Literal::parse(&case)
			.map_err(|e| VmError::execution("ValueError", e.to_string()))?;
		if Value::from(case) == value {
			frame.branch(&target)?;
			break;
		}
	}
	Ok(())
}

fn if_eq(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = frame.get(arg(args, 0)?)? == frame.get(arg(args, 1)?)?;
	branch_if(frame, args, 2, taken)
}

fn if_ne(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = frame.get(arg(args, 0)?)? != frame.get(arg(args, 1)?)?;
	branch_if(frame, args, 2, taken)
}

fn if_lt(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &frame.get(arg(args, 1)?)?)? == Ordering::Less;
	branch_if(frame, args, 2, taken)
}

fn if_le(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &frame.get(arg(args, 1)?)?)? != Ordering::Greater;
	branch_if(frame, args, 2, taken)
}

fn if_gt(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &frame.get(arg(args, 1)?)?)? == Ordering::Greater;
	branch_if(frame, args, 2, taken)
}

fn if_ge(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &frame.get(arg(args, 1)?)?)? != Ordering::Less;
	branch_if(frame, args, 2, taken)
}

fn if_eqz(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = frame.get(arg(args, 0)?)? == Value::Int(0);
	branch_if(frame, args, 1, taken)
}

fn if_nez(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = frame.get(arg(args, 0)?)? != Value::Int(0);
	branch_if(frame, args, 1, taken)
}

fn if_ltz(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &Value::Int(0))? == Ordering::Less;
	branch_if(frame, args, 1, taken)
}

fn if_lez(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &Value::Int(0))? != Ordering::Greater;
	branch_if(frame, args, 1, taken)
}

fn if_gtz(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &Value::Int(0))? == Ordering::Greater;
	branch_if(frame, args, 1, taken)
}

fn if_gez(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let taken = ordering(&frame.get(arg(args, 0)?)?, &Value::Int(0))? != Ordering::Less;
	branch_if(frame, args, 1, taken)
}

fn neg(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?;
	let negated = match value {
		Value::Int(int) => Value::Int(int.wrapping_neg()),
		Value::Float(float) => Value::Float(-float),
		Value::Bool(bool) => Value::Int(-i64::from(bool)),
		other => return Err(VmError::execution("TypeError", format!("cannot negate {}", other.type_name()))),
	};
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, negated);
	Ok(())
}

fn not(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int(!value));
	Ok(())
}

fn int_to_long(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	// the 64 bit mask is the identity on the register width
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int(value));
	Ok(())
}

fn long_to_int(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int(value & 0xFFFF_FFFF));
	Ok(())
}

fn int_to_char(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int(value & 0xFFFF));
	Ok(())
}

/// Sign extending cast of the low 8 bits.
fn int_to_byte(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Int((value.wrapping_add(0x80) & 0xFF) - 0x80));
	Ok(())
}

fn int_to_float(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	let value = frame.get(arg(args, 1)?)?.as_int()?;
	let dest = arg(args, 0)?.to_owned();
	frame.set(dest, Value::Float(value as f64));
	Ok(())
}

fn add(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_add)
}

fn sub(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_sub)
}

fn mul(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_mul)
}

fn div_int(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_floor_div)
}

fn div_float(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_true_div)
}

fn rem(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_rem)
}

fn and(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_and)
}

fn or(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_or)
}

fn xor(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_xor)
}

fn shl(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_shl)
}

fn shr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_shr)
}

fn ushr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary(frame, args, val_ushr)
}

fn add_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_add)
}

fn sub_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_sub)
}

fn mul_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_mul)
}

fn div_int_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_floor_div)
}

fn div_float_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_true_div)
}

fn rem_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_rem)
}

fn and_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_and)
}

fn or_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_or)
}

fn xor_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_xor)
}

fn shl_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_shl)
}

fn shr_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_shr)
}

fn ushr_two_addr(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_two_addr(frame, args, val_ushr)
}

fn add_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_add)
}

fn add_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_add)
}

fn rsub_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_rsub)
}

fn rsub_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_rsub)
}

fn mul_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_mul)
}

fn mul_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_mul)
}

fn div_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_floor_div)
}

fn div_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_floor_div)
}

fn rem_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_rem)
}

fn rem_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_rem)
}

fn and_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_and)
}

fn and_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_and)
}

fn or_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_or)
}

fn or_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_or)
}

fn xor_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_xor)
}

fn xor_lit16(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFFFF, val_xor)
}

fn shl_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_shl)
}

fn shr_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_shr)
}

fn ushr_lit8(_vm: &SmaliVm, frame: &mut Frame, args: &[String]) -> Result<(), VmError> {
	binary_literal(frame, args, 0xFF, val_ushr)
}
