//! The VM façade: class registry, the call entry point, and the
//! visitors that turn parser events into the class model.

use std::cell::RefCell;
use std::rc::Rc;
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use sable::flags::AccessFlags;
use sable::reader::SmaliReader;
use sable::types::{Literal, MethodSignature, Type};
use sable::visitor::annotation::AnnotationVisitor;
use sable::visitor::class::ClassVisitor;
use sable::visitor::field::FieldVisitor;
use sable::visitor::method::MethodVisitor;
use crate::errors::VmError;
use crate::executor::{self, Opcode, OpcodeTable};
use crate::frame::{CallerContext, CodeBody, Frame, SwitchData};
use crate::lang::{AnnotationValue, Member, SmaliAnnotation, SmaliClass, SmaliField, SmaliMethod};
use crate::objects;
use crate::value::Value;

/// Hooks around every executed opcode, for tracing and debugging.
pub trait DebugHandler {
	/// Called before an opcode executor is processed.
	fn precall(&mut self, _method: &SmaliMethod, _opcode: &Opcode, _frame: &Frame) {}

	/// Called after the opcode has been executed.
	fn postcall(&mut self, _method: &SmaliMethod, _opcode: &Opcode, _frame: &Frame) {}
}

// the parameter descriptor groups a host value kind may bind to
const INT_DESCRIPTORS: &[&str] = &[
	"B", "S", "I", "J",
	"Ljava/lang/Byte;", "Ljava/lang/Short;", "Ljava/lang/Integer;", "Ljava/lang/Long;",
];
const FLOAT_DESCRIPTORS: &[&str] = &["F", "D", "Ljava/lang/Float;", "Ljava/lang/Double;"];
const STRING_DESCRIPTORS: &[&str] = &["Ljava/lang/String;", "C", "Ljava/lang/Character;"];
const BOOL_DESCRIPTORS: &[&str] = &["Z", "Ljava/lang/Boolean;"];

/// An in-process register machine for Smali classes.
///
/// Classes enter the VM through [`SmaliVm::load_class`] (or
/// [`SmaliVm::define_class`] to skip the initializer) and run through
/// [`SmaliVm::call`].
pub struct SmaliVm {
	classes: RefCell<IndexMap<String, Rc<SmaliClass>>>,
	opcodes: OpcodeTable,
	use_strict: bool,
	debug_handler: RefCell<Option<Box<dyn DebugHandler>>>,
}

impl Default for SmaliVm {
	fn default() -> SmaliVm {
		SmaliVm::new()
	}
}

impl SmaliVm {
	pub fn new() -> SmaliVm {
		SmaliVm::with_options(OpcodeTable::standard(), false)
	}

	/// A VM with a custom opcode table. `use_strict` makes unknown
	/// opcodes a parse error instead of a no-op.
	pub fn with_options(opcodes: OpcodeTable, use_strict: bool) -> SmaliVm {
		SmaliVm {
			classes: RefCell::new(IndexMap::new()),
			opcodes,
			use_strict,
			debug_handler: RefCell::new(None),
		}
	}

	pub fn opcodes(&self) -> &OpcodeTable {
		&self.opcodes
	}

	pub fn use_strict(&self) -> bool {
		self.use_strict
	}

	pub fn set_debug_handler(&self, handler: Option<Box<dyn DebugHandler>>) {
		*self.debug_handler.borrow_mut() = handler;
	}

	/// Registers a class under its descriptor.
	pub fn new_class(&self, class: Rc<SmaliClass>) {
		self.classes.borrow_mut().insert(class.descriptor(), class);
	}

	/// Resolves a class by descriptor or dotted name.
	pub fn get_class(&self, name: &str) -> Result<Rc<SmaliClass>, VmError> {
		let descriptor = Type::parse(name)
			.map(|ty| ty.descriptor())
			.unwrap_or_else(|_| name.to_owned());
		self.classes.borrow()
			.get(&descriptor)
			.cloned()
			.ok_or(VmError::NoSuchClass(descriptor))
	}

	pub fn classes(&self) -> Vec<Rc<SmaliClass>> {
		self.classes.borrow().values().cloned().collect()
	}

	/// Parses the source into a class and registers it. The class
	/// initializer does not run.
	pub fn define_class(&self, source: &str) -> Result<Rc<SmaliClass>> {
		let reader = SmaliReader::new();
		let mut visitor = ClassDefVisitor::new(self);
		reader.visit(source, &mut visitor).context("failed to parse class")?;

		let class = visitor.into_class()
			.ok_or_else(|| anyhow!("could not parse class: no class definition"))?;
		self.new_class(class.clone());
		Ok(class)
	}

	/// Defines the class and runs `<clinit>` when `init` is set. An
	/// initializer failure is reported but does not unregister the
	/// class. With `lookup_missing`, referenced super classes and
	/// interfaces must already be defined.
	pub fn load_class(&self, source: &str, init: bool, lookup_missing: bool) -> Result<Rc<SmaliClass>> {
		let class = self.define_class(source)?;

		if lookup_missing {
			let mut referenced = Vec::new();
			referenced.extend(class.super_class());
			referenced.extend(class.interfaces());
			for ty in referenced {
				let descriptor = ty.descriptor();
				if objects::builtin(&descriptor).is_some() {
					continue;
				}
				self.get_class(&descriptor)
					.with_context(|| anyhow!("unresolved reference of class {}", class.name()))?;
			}
		}

		if init {
			if let Err(error) = class.clinit(self) {
				warn!("class initializer of {} failed: {error}", class.name());
			}
		}
		Ok(class)
	}

	/// Runs a method. Non-static methods need a receiver; arguments are
	/// validated against the declared parameter descriptors.
	pub fn call(&self, method: &Rc<SmaliMethod>, receiver: Option<Value>, args: &[Value]) -> Result<Value, VmError> {
		self.call_from(method, receiver, args, None)
	}

	pub(crate) fn call_from(
		&self,
		method: &Rc<SmaliMethod>,
		receiver: Option<Value>,
		args: &[Value],
		parent: Option<CallerContext>,
	) -> Result<Value, VmError> {
		if method.is_abstract() {
			return Err(VmError::Unsupported(format!(
				"abstract method {} cannot be executed",
				method.full_signature(),
			)));
		}
		let code = method.code()
			.cloned()
			.ok_or_else(|| VmError::NoSuchMethod(format!(
				"method {} has no executable body",
				method.full_signature(),
			)))?;

		let mut frame = Frame::new(method.full_signature(), code.clone());
		frame.parent = parent;

		for index in 0..method.locals() {
			frame.set(format!("v{index}"), Value::Null);
		}

		let start = if method.is_static() {
			0
		} else {
			match receiver {
				Some(value) if value != Value::Null => frame.set("p0", value),
				_ => {
					let owner = method.declaring_class()
						.map(|class| class.name())
						.unwrap_or_default();
					return Err(VmError::execution(
						"NullPointerError",
						format!("expected an instance of '{owner}'"),
					));
				},
			}
			1
		};

		if args.len() != method.parameters().len() {
			return Err(VmError::execution("ArgumentError", format!(
				"invalid argument count - expected {}, got {}",
				method.parameters().len(),
				args.len(),
			)));
		}
		for (index, (parameter, value)) in method.parameters().iter().zip(args).enumerate() {
			self.check_parameter(parameter, value)?;
			frame.set(format!("p{}", start + index), value.clone());
		}

		debug!("calling {}", method.full_signature());

		while !frame.finished && frame.error.is_none() {
			let Some(instruction) = code.opcodes().get(frame.pos) else {
				// fell off the end of the opcode list
				break;
			};
			frame.pos += 1;

			if let Some(handler) = self.debug_handler.borrow_mut().as_mut() {
				handler.precall(method, &instruction.opcode, &frame);
			}
			if let Err(error) = instruction.opcode.run(self, &mut frame, &instruction.args) {
				frame.error = Some(error);
			}
			if let Some(handler) = self.debug_handler.borrow_mut().as_mut() {
				handler.postcall(method, &instruction.opcode, &frame);
			}
		}

		if let Some(error) = frame.error.take() {
			return Err(error);
		}
		Ok(frame.return_value)
	}

	fn check_parameter(&self, parameter: &Type, value: &Value) -> Result<(), VmError> {
		let descriptor = parameter.descriptor();
		let descriptor = descriptor.as_str();

		let matches = if INT_DESCRIPTORS.contains(&descriptor) {
			matches!(value, Value::Int(_))
		} else if FLOAT_DESCRIPTORS.contains(&descriptor) {
			matches!(value, Value::Float(_))
		} else if STRING_DESCRIPTORS.contains(&descriptor) {
			matches!(value, Value::String(_))
		} else if BOOL_DESCRIPTORS.contains(&descriptor) {
			matches!(value, Value::Bool(_))
		} else {
			// any other class descriptor must be loaded
			if matches!(parameter, Type::Class(_)) && objects::builtin(descriptor).is_none() {
				self.get_class(descriptor)?;
			}
			true
		};

		if !matches {
			return Err(VmError::execution("TypeError", format!(
				"invalid type for parameter, expected {descriptor} - got {}",
				value.type_name(),
			)));
		}
		Ok(())
	}
}

/// Builds a [`SmaliClass`] from parser events.
pub struct ClassDefVisitor<'vm> {
	vm: &'vm SmaliVm,
	class: Option<Rc<SmaliClass>>,
}

impl<'vm> ClassDefVisitor<'vm> {
	pub fn new(vm: &'vm SmaliVm) -> ClassDefVisitor<'vm> {
		ClassDefVisitor { vm, class: None }
	}

	pub fn into_class(self) -> Option<Rc<SmaliClass>> {
		self.class
	}

	fn current(&self) -> Result<&Rc<SmaliClass>> {
		self.class.as_ref().ok_or_else(|| anyhow!("missing class definition"))
	}
}

impl<'vm> ClassVisitor for ClassDefVisitor<'vm> {
	type Annotation = AnnotationDefVisitor;
	type Field = FieldDefVisitor;
	type Method = MethodDefVisitor<'vm>;
	type Inner = ClassDefVisitor<'vm>;

	fn visit_class(&mut self, name: &Type, access: AccessFlags) -> Result<()> {
		self.class = Some(Rc::new(SmaliClass::new(name.clone(), access)));
		Ok(())
	}

	fn visit_super(&mut self, super_class: &Type) -> Result<()> {
		self.current()?.set_super_class(super_class.clone());
		Ok(())
	}

	fn visit_implements(&mut self, interface: &Type) -> Result<()> {
		self.current()?.add_interface(interface.clone());
		Ok(())
	}

	fn visit_field(&mut self, access: AccessFlags, name: &str, descriptor: &Type, value: Option<&str>) -> Result<Option<FieldDefVisitor>> {
		let class = self.current()?;
		let value = match value {
			Some(raw) => Value::from(Literal::parse(raw)?),
			None => Value::Null,
		};
		let field = Rc::new(SmaliField::new(
			Rc::downgrade(class),
			name,
			descriptor.clone(),
			access,
			value,
		));
		class.add_field(field.clone());
		Ok(Some(FieldDefVisitor { field }))
	}

	fn visit_method(&mut self, access: AccessFlags, signature: &MethodSignature) -> Result<Option<MethodDefVisitor<'vm>>> {
		Ok(Some(MethodDefVisitor::new(self.vm, self.current()?.clone(), access, signature.clone())))
	}

	fn finish_method(&mut self, method: MethodDefVisitor<'vm>) -> Result<()> {
		let class = self.current()?.clone();
		class.add_method(Rc::new(method.build()))?;
		Ok(())
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationDefVisitor>> {
		let class = self.current()?;
		let annotation = Rc::new(SmaliAnnotation::new(Rc::downgrade(class), descriptor.clone(), access));
		Ok(Some(AnnotationDefVisitor { annotation }))
	}

	fn finish_annotation(&mut self, annotation: AnnotationDefVisitor) -> Result<()> {
		self.current()?.add_annotation(annotation.annotation);
		Ok(())
	}

	fn visit_inner_class(&mut self, name: &Type, access: AccessFlags) -> Result<Option<ClassDefVisitor<'vm>>> {
		let outer = self.current()?;
		let inner = Rc::new(SmaliClass::new(name.clone(), access));
		inner.set_parent(Rc::downgrade(outer));
		outer.add_inner_class(inner.clone());
		Ok(Some(ClassDefVisitor { vm: self.vm, class: Some(inner) }))
	}
}

/// Collects the annotations of a field definition.
pub struct FieldDefVisitor {
	field: Rc<SmaliField>,
}

impl FieldVisitor for FieldDefVisitor {
	type Annotation = AnnotationDefVisitor;

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationDefVisitor>> {
		let parent = self.field.declaring_class()
			.map(|class| Rc::downgrade(&class))
			.unwrap_or_default();
		let annotation = Rc::new(SmaliAnnotation::new(parent, descriptor.clone(), access));
		Ok(Some(AnnotationDefVisitor { annotation }))
	}

	fn finish_annotation(&mut self, annotation: AnnotationDefVisitor) -> Result<()> {
		self.field.add_annotation(annotation.annotation);
		Ok(())
	}
}

/// Assembles a method body: resolves each instruction to its executor
/// and collects the label, catch, array-data and switch tables.
pub struct MethodDefVisitor<'vm> {
	vm: &'vm SmaliVm,
	owner: Rc<SmaliClass>,
	access: AccessFlags,
	signature: MethodSignature,
	locals: usize,
	code: CodeBody,
	last_label: Option<String>,
	annotations: Vec<Rc<SmaliAnnotation>>,
}

impl<'vm> MethodDefVisitor<'vm> {
	fn new(vm: &'vm SmaliVm, owner: Rc<SmaliClass>, access: AccessFlags, signature: MethodSignature) -> MethodDefVisitor<'vm> {
		MethodDefVisitor {
			vm,
			owner,
			access,
			signature,
			locals: 0,
			code: CodeBody::default(),
			last_label: None,
			annotations: Vec::new(),
		}
	}

	fn build(self) -> SmaliMethod {
		let code = if self.access.contains(AccessFlags::ABSTRACT | AccessFlags::NATIVE) {
			None
		} else {
			Some(Rc::new(self.code))
		};
		SmaliMethod::new(&self.owner, self.access, &self.signature, self.locals, self.annotations, code)
	}

	/// Resolves an opcode name. Unknown names fail in strict mode and
	/// fall back to the `*` wildcard or `nop` otherwise.
	fn resolve(&self, name: &str) -> Result<Opcode> {
		if let Some(opcode) = self.vm.opcodes().get(name) {
			Ok(opcode)
		} else if self.vm.use_strict() {
			Err(VmError::InvalidOpcode(name.to_owned()).into())
		} else {
			Ok(self.vm.opcodes().wildcard().unwrap_or(executor::NOP))
		}
	}

	fn push(&mut self, opcode: Opcode, args: Vec<String>) {
		self.code.opcodes.push(executor::Instruction { opcode, args });
	}

	fn data_label(&self) -> String {
		self.last_label.clone().unwrap_or_default()
	}
}

impl<'vm> MethodVisitor for MethodDefVisitor<'vm> {
	type Annotation = AnnotationDefVisitor;

	fn visit_locals(&mut self, count: usize) -> Result<()> {
		self.locals = count;
		Ok(())
	}

	fn visit_registers(&mut self, count: usize) -> Result<()> {
		// parameters plus the receiver for non-static methods occupy
		// the upper registers
		let receiver = usize::from(!self.access.contains(AccessFlags::STATIC));
		self.locals = count.saturating_sub(self.signature.parameters().len() + receiver);
		Ok(())
	}

	fn visit_block(&mut self, label: &str) -> Result<()> {
		self.code.labels.insert(label.to_owned(), self.code.opcodes.len());
		self.last_label = Some(label.to_owned());
		Ok(())
	}

	fn visit_goto(&mut self, label: &str) -> Result<()> {
		let opcode = self.resolve(sable::opcode::GOTO)?;
		self.push(opcode, vec![label.to_owned()]);
		Ok(())
	}

	fn visit_invoke(&mut self, kind: &str, registers: &[String], owner: &Type, method: &str) -> Result<()> {
		let opcode = self.resolve(sable::opcode::INVOKE)?;
		let mut args = vec![kind.to_owned(), owner.descriptor(), method.to_owned()];
		args.extend_from_slice(registers);
		self.push(opcode, args);
		Ok(())
	}

	fn visit_return(&mut self, kind: &str, args: &[String]) -> Result<()> {
		let name = if kind.is_empty() {
			sable::opcode::RETURN.to_owned()
		} else {
			format!("{}-{kind}", sable::opcode::RETURN)
		};
		let opcode = self.resolve(&name)?;
		self.push(opcode, args.to_vec());
		Ok(())
	}

	fn visit_instruction(&mut self, name: &str, args: &[String]) -> Result<()> {
		let opcode = self.resolve(name)?;
		self.push(opcode, args.to_vec());
		Ok(())
	}

	fn visit_catch(&mut self, exception: &Type, start: &str, _end: &str, handler: &str) -> Result<()> {
		self.code.catches.insert(start.to_owned(), (exception.clone(), handler.to_owned()));
		Ok(())
	}

	fn visit_catchall(&mut self, start: &str, _end: &str, handler: &str) -> Result<()> {
		let exception = Type::Class("java/lang/Exception".to_owned());
		self.code.catches.insert(start.to_owned(), (exception, handler.to_owned()));
		Ok(())
	}

	fn visit_packed_switch(&mut self, base: &str, targets: &[String]) -> Result<()> {
		self.code.switch_data.insert(self.data_label(), SwitchData::Packed {
			base: base.to_owned(),
			targets: targets.to_vec(),
		});
		Ok(())
	}

	fn visit_sparse_switch(&mut self, branches: &[(String, String)]) -> Result<()> {
		self.code.switch_data.insert(self.data_label(), SwitchData::Sparse(branches.to_vec()));
		Ok(())
	}

	fn visit_array_data(&mut self, _width: &str, values: &[Literal]) -> Result<()> {
		self.code.array_data.insert(self.data_label(), values.to_vec());
		Ok(())
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationDefVisitor>> {
		let annotation = Rc::new(SmaliAnnotation::new(Rc::downgrade(&self.owner), descriptor.clone(), access));
		Ok(Some(AnnotationDefVisitor { annotation }))
	}

	fn finish_annotation(&mut self, annotation: AnnotationDefVisitor) -> Result<()> {
		self.annotations.push(annotation.annotation);
		Ok(())
	}
}

/// Fills the attribute map of one annotation.
pub struct AnnotationDefVisitor {
	annotation: Rc<SmaliAnnotation>,
}

fn decode_attribute(raw: &str) -> AnnotationValue {
	match Literal::parse(raw) {
		Ok(literal) => AnnotationValue::Literal(literal),
		// tokens without a literal form stay raw
		Err(_) => AnnotationValue::Literal(Literal::String(raw.to_owned())),
	}
}

impl AnnotationVisitor for AnnotationDefVisitor {
	type Sub = AnnotationDefVisitor;

	fn visit_value(&mut self, name: &str, value: &str) -> Result<()> {
		self.annotation.set_attribute(name, decode_attribute(value));
		Ok(())
	}

	fn visit_array(&mut self, name: &str, values: &[String]) -> Result<()> {
		let values = values.iter()
			.map(|value| decode_attribute(value))
			.collect();
		self.annotation.set_attribute(name, AnnotationValue::Array(values));
		Ok(())
	}

	fn visit_enum(&mut self, name: &str, owner: &Type, const_name: &str, const_type: &Type) -> Result<()> {
		self.annotation.set_attribute(name, AnnotationValue::Enum {
			owner: owner.clone(),
			name: const_name.to_owned(),
			descriptor: const_type.clone(),
		});
		Ok(())
	}

	fn visit_subannotation(&mut self, _name: &str, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationDefVisitor>> {
		let sub = Rc::new(SmaliAnnotation::new(self.annotation.parent_weak(), descriptor.clone(), access));
		Ok(Some(AnnotationDefVisitor { annotation: sub }))
	}

	fn finish_subannotation(&mut self, name: &str, sub: AnnotationDefVisitor) -> Result<()> {
		self.annotation.set_attribute(name, AnnotationValue::Annotation(sub.annotation));
		Ok(())
	}
}
