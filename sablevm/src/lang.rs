//! The reflective class model: classes, methods, fields, annotations and
//! live object instances.
//!
//! Classes reference their super class and interfaces by descriptor and
//! resolve them through the VM registry, so there are no ownership
//! cycles; parent back-references are [`Weak`] and only used for lookup.

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};
use indexmap::IndexMap;
use sable::flags::AccessFlags;
use sable::types::{Literal, MethodSignature, Type};
use crate::errors::VmError;
use crate::frame::CodeBody;
use crate::value::Value;
use crate::vm::SmaliVm;

const JAVA_LANG_OBJECT: &str = "Ljava/lang/Object;";

/// Common surface of annotations, fields, methods and classes.
pub trait Member {
	/// The type descriptor owned by this member. For methods this is the
	/// fully qualified method signature type.
	fn member_type(&self) -> &Type;

	/// The signature identifying this member within its parent.
	fn signature(&self) -> String;

	fn modifiers(&self) -> AccessFlags;

	/// The declaring class, when one is known.
	fn declaring_class(&self) -> Option<Rc<SmaliClass>>;

	/// The applied annotations of the given annotation type.
	fn get_annotations(&self, descriptor: &str) -> Vec<Rc<SmaliAnnotation>>;

	fn is_annotation_present(&self, descriptor: &str) -> bool {
		!self.get_annotations(descriptor).is_empty()
	}
}

type AnnotationTable = RefCell<IndexMap<String, Vec<Rc<SmaliAnnotation>>>>;

fn annotations_of(table: &AnnotationTable, descriptor: &str) -> Vec<Rc<SmaliAnnotation>> {
	table.borrow().get(descriptor).cloned().unwrap_or_default()
}

fn add_annotation(table: &AnnotationTable, annotation: Rc<SmaliAnnotation>) {
	table.borrow_mut()
		.entry(annotation.descriptor())
		.or_default()
		.push(annotation);
}

/// An attribute value of an annotation.
#[derive(Debug, Clone)]
pub enum AnnotationValue {
	Literal(Literal),
	Array(Vec<AnnotationValue>),
	Enum { owner: Type, name: String, descriptor: Type },
	Annotation(Rc<SmaliAnnotation>),
}

/// An annotation applied to a member, behaving as an attribute map.
pub struct SmaliAnnotation {
	ty: Type,
	modifiers: AccessFlags,
	parent: RefCell<Weak<SmaliClass>>,
	attributes: RefCell<IndexMap<String, AnnotationValue>>,
}

impl SmaliAnnotation {
	pub(crate) fn new(parent: Weak<SmaliClass>, ty: Type, modifiers: AccessFlags) -> SmaliAnnotation {
		SmaliAnnotation {
			ty,
			modifiers,
			parent: RefCell::new(parent),
			attributes: RefCell::new(IndexMap::new()),
		}
	}

	pub fn descriptor(&self) -> String {
		self.ty.descriptor()
	}

	pub fn attribute(&self, name: &str) -> Option<AnnotationValue> {
		self.attributes.borrow().get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.attributes.borrow().contains_key(name)
	}

	pub fn attribute_names(&self) -> Vec<String> {
		self.attributes.borrow().keys().cloned().collect()
	}

	pub(crate) fn set_attribute(&self, name: impl Into<String>, value: AnnotationValue) {
		self.attributes.borrow_mut().insert(name.into(), value);
	}

	pub(crate) fn parent_weak(&self) -> Weak<SmaliClass> {
		self.parent.borrow().clone()
	}
}

impl Member for SmaliAnnotation {
	fn member_type(&self) -> &Type {
		&self.ty
	}

	fn signature(&self) -> String {
		self.ty.descriptor()
	}

	fn modifiers(&self) -> AccessFlags {
		self.modifiers
	}

	fn declaring_class(&self) -> Option<Rc<SmaliClass>> {
		self.parent.borrow().upgrade()
	}

	fn get_annotations(&self, _descriptor: &str) -> Vec<Rc<SmaliAnnotation>> {
		// annotations carry no annotations of their own
		Vec::new()
	}
}

impl Debug for SmaliAnnotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SmaliAnnotation {{ {} }}", self.ty.descriptor())
	}
}

/// A field definition. Static fields keep their value here, instance
/// field values live on the [`SmaliObject`].
pub struct SmaliField {
	ty: Type,
	name: String,
	modifiers: AccessFlags,
	parent: RefCell<Weak<SmaliClass>>,
	value: RefCell<Value>,
	annotations: AnnotationTable,
}

impl SmaliField {
	pub(crate) fn new(parent: Weak<SmaliClass>, name: impl Into<String>, ty: Type, modifiers: AccessFlags, value: Value) -> SmaliField {
		SmaliField {
			ty,
			name: name.into(),
			modifiers,
			parent: RefCell::new(parent),
			value: RefCell::new(value),
			annotations: RefCell::new(IndexMap::new()),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn descriptor(&self) -> String {
		self.ty.descriptor()
	}

	pub fn value(&self) -> Value {
		self.value.borrow().clone()
	}

	pub fn set_value(&self, value: Value) {
		*self.value.borrow_mut() = value;
	}

	pub fn is_static(&self) -> bool {
		self.modifiers.contains(AccessFlags::STATIC)
	}

	pub fn is_final(&self) -> bool {
		self.modifiers.contains(AccessFlags::FINAL)
	}

	pub(crate) fn add_annotation(&self, annotation: Rc<SmaliAnnotation>) {
		add_annotation(&self.annotations, annotation);
	}
}

impl Member for SmaliField {
	fn member_type(&self) -> &Type {
		&self.ty
	}

	fn signature(&self) -> String {
		format!("{}:{}", self.name, self.ty.descriptor())
	}

	fn modifiers(&self) -> AccessFlags {
		self.modifiers
	}

	fn declaring_class(&self) -> Option<Rc<SmaliClass>> {
		self.parent.borrow().upgrade()
	}

	fn get_annotations(&self, descriptor: &str) -> Vec<Rc<SmaliAnnotation>> {
		annotations_of(&self.annotations, descriptor)
	}
}

impl Debug for SmaliField {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SmaliField {{ {} }}", self.signature())
	}
}

/// A method definition with its compiled body.
pub struct SmaliMethod {
	ty: Type,
	name: String,
	parameters: Vec<Type>,
	return_type: Type,
	modifiers: AccessFlags,
	locals: usize,
	parent: RefCell<Weak<SmaliClass>>,
	annotations: AnnotationTable,
	code: Option<Rc<CodeBody>>,
}

impl SmaliMethod {
	pub(crate) fn new(
		owner: &Rc<SmaliClass>,
		modifiers: AccessFlags,
		signature: &MethodSignature,
		locals: usize,
		annotations: Vec<Rc<SmaliAnnotation>>,
		code: Option<Rc<CodeBody>>,
	) -> SmaliMethod {
		let qualified = MethodSignature::new(
			Some(owner.member_type().clone()),
			signature.name().to_owned(),
			signature.parameters().to_vec(),
			signature.return_type().clone(),
		);
		let method = SmaliMethod {
			ty: Type::Method(Box::new(qualified)),
			name: signature.name().to_owned(),
			parameters: signature.parameters().to_vec(),
			return_type: signature.return_type().clone(),
			modifiers,
			locals,
			parent: RefCell::new(Rc::downgrade(owner)),
			annotations: RefCell::new(IndexMap::new()),
			code,
		};
		for annotation in annotations {
			add_annotation(&method.annotations, annotation);
		}
		method
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parameters(&self) -> &[Type] {
		&self.parameters
	}

	pub fn return_type(&self) -> &Type {
		&self.return_type
	}

	pub fn returns_void(&self) -> bool {
		self.return_type.descriptor() == "V"
	}

	/// The number of `vN` local registers.
	pub fn locals(&self) -> usize {
		self.locals
	}

	pub fn is_static(&self) -> bool {
		self.modifiers.contains(AccessFlags::STATIC)
	}

	pub fn is_abstract(&self) -> bool {
		self.modifiers.contains(AccessFlags::ABSTRACT)
	}

	pub fn code(&self) -> Option<&Rc<CodeBody>> {
		self.code.as_ref()
	}

	/// The owner qualified signature, `Lowner;->name(params)ret`.
	pub fn full_signature(&self) -> String {
		self.ty.descriptor()
	}
}

impl Member for SmaliMethod {
	fn member_type(&self) -> &Type {
		&self.ty
	}

	fn signature(&self) -> String {
		let mut signature = String::from(&self.name);
		signature.push('(');
		for parameter in &self.parameters {
			signature.push_str(&parameter.descriptor());
		}
		signature.push(')');
		signature.push_str(&self.return_type.descriptor());
		signature
	}

	fn modifiers(&self) -> AccessFlags {
		self.modifiers
	}

	fn declaring_class(&self) -> Option<Rc<SmaliClass>> {
		self.parent.borrow().upgrade()
	}

	fn get_annotations(&self, descriptor: &str) -> Vec<Rc<SmaliAnnotation>> {
		annotations_of(&self.annotations, descriptor)
	}
}

impl Debug for SmaliMethod {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SmaliMethod {{ {} }}", self.full_signature())
	}
}

/// The overload set of one method name.
///
/// Resolution picks the single overload when there is only one,
/// otherwise filters by positional argument count, then by the void /
/// non-void hint. Remaining ambiguity is an error.
#[derive(Debug, Clone, Default)]
pub struct MethodBroker {
	name: String,
	methods: Vec<Rc<SmaliMethod>>,
}

impl MethodBroker {
	fn new(name: impl Into<String>) -> MethodBroker {
		MethodBroker { name: name.into(), methods: Vec::new() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn methods(&self) -> &[Rc<SmaliMethod>] {
		&self.methods
	}

	fn add(&mut self, method: Rc<SmaliMethod>) -> Result<(), VmError> {
		if self.methods.iter().any(|x| x.signature() == method.signature()) {
			return Err(VmError::Unsupported(format!(
				"duplicate method definition: {}",
				method.full_signature(),
			)));
		}
		self.methods.push(method);
		Ok(())
	}

	/// Resolves an overload for the given positional argument count.
	/// `returns` hints whether the call site wants a value back: `true`
	/// selects non-void overloads, `false` void ones.
	pub fn resolve(&self, argc: usize, returns: Option<bool>) -> Result<Rc<SmaliMethod>, VmError> {
		if let [method] = self.methods.as_slice() {
			return Ok(method.clone());
		}

		let targets: Vec<&Rc<SmaliMethod>> = self.methods.iter()
			.filter(|x| x.parameters().len() == argc)
			.collect();
		if let [method] = targets.as_slice() {
			return Ok((*method).clone());
		}

		let Some(returns) = returns else {
			return Err(VmError::NoSuchMethod(format!(
				"attempted to call {}() with invalid arguments",
				self.name,
			)));
		};
		let targets: Vec<&Rc<SmaliMethod>> = targets.into_iter()
			.filter(|x| x.returns_void() != returns)
			.collect();
		if let [method] = targets.as_slice() {
			return Ok((*method).clone());
		}

		Err(VmError::NoSuchMethod(format!(
			"attempted to call {}() - multiple variants present",
			self.name,
		)))
	}
}

/// A class definition. Members are added monotonically while the class
/// is being parsed and only read afterwards.
pub struct SmaliClass {
	ty: Type,
	modifiers: AccessFlags,
	parent: RefCell<Weak<SmaliClass>>,
	super_class: RefCell<Option<Type>>,
	interfaces: RefCell<Vec<Type>>,
	fields: RefCell<IndexMap<String, Rc<SmaliField>>>,
	methods: RefCell<IndexMap<String, MethodBroker>>,
	inner_classes: RefCell<IndexMap<String, Rc<SmaliClass>>>,
	annotations: AnnotationTable,
	initialized: Cell<bool>,
}

impl SmaliClass {
	pub fn new(ty: Type, modifiers: AccessFlags) -> SmaliClass {
		SmaliClass {
			ty,
			modifiers,
			parent: RefCell::new(Weak::new()),
			super_class: RefCell::new(None),
			interfaces: RefCell::new(Vec::new()),
			fields: RefCell::new(IndexMap::new()),
			methods: RefCell::new(IndexMap::new()),
			inner_classes: RefCell::new(IndexMap::new()),
			annotations: RefCell::new(IndexMap::new()),
			initialized: Cell::new(false),
		}
	}

	/// The full name with dots, `com.example.Class`.
	pub fn name(&self) -> String {
		self.ty.pretty_name()
	}

	pub fn simple_name(&self) -> String {
		self.ty.simple_name()
	}

	pub fn descriptor(&self) -> String {
		self.ty.descriptor()
	}

	pub fn super_class(&self) -> Option<Type> {
		self.super_class.borrow().clone()
	}

	pub(crate) fn set_super_class(&self, super_class: Type) {
		*self.super_class.borrow_mut() = Some(super_class);
	}

	pub fn interfaces(&self) -> Vec<Type> {
		self.interfaces.borrow().clone()
	}

	pub(crate) fn add_interface(&self, interface: Type) {
		let mut interfaces = self.interfaces.borrow_mut();
		if !interfaces.contains(&interface) {
			interfaces.push(interface);
		}
	}

	pub(crate) fn set_parent(&self, parent: Weak<SmaliClass>) {
		*self.parent.borrow_mut() = parent;
	}

	pub(crate) fn add_field(&self, field: Rc<SmaliField>) {
		self.fields.borrow_mut().insert(field.name().to_owned(), field);
	}

	pub(crate) fn add_method(&self, method: Rc<SmaliMethod>) -> Result<(), VmError> {
		self.methods.borrow_mut()
			.entry(method.name().to_owned())
			.or_insert_with(|| MethodBroker::new(method.name()))
			.add(method)
	}

	pub(crate) fn add_inner_class(&self, inner: Rc<SmaliClass>) {
		self.inner_classes.borrow_mut().insert(inner.descriptor(), inner);
	}

	pub(crate) fn add_annotation(&self, annotation: Rc<SmaliAnnotation>) {
		add_annotation(&self.annotations, annotation);
	}

	pub fn field(&self, name: &str) -> Result<Rc<SmaliField>, VmError> {
		self.fields.borrow()
			.get(name)
			.cloned()
			.ok_or_else(|| VmError::NoSuchField(name.to_owned()))
	}

	/// The fields matching the access flag filter, all of them without
	/// one.
	pub fn fields(&self, filter: Option<AccessFlags>) -> Vec<Rc<SmaliField>> {
		self.fields.borrow()
			.values()
			.filter(|x| filter.is_none_or(|flags| x.modifiers().contains(flags)))
			.cloned()
			.collect()
	}

	/// The overload set for a simple method name.
	pub fn broker(&self, name: &str) -> Result<MethodBroker, VmError> {
		self.methods.borrow()
			.get(name)
			.cloned()
			.ok_or_else(|| VmError::NoSuchMethod(format!(
				"method with signature {name:?} not found in {}",
				self.name(),
			)))
	}

	/// Resolves a method by broker name or by exact overload signature
	/// (`name(params)ret`).
	pub fn method(&self, key: &str) -> Result<Rc<SmaliMethod>, VmError> {
		if key.contains('(') {
			for broker in self.methods.borrow().values() {
				for method in broker.methods() {
					if method.signature() == key {
						return Ok(method.clone());
					}
				}
			}
			return Err(VmError::NoSuchMethod(format!(
				"method with signature {key:?} not found in {}",
				self.name(),
			)));
		}
		self.broker(key)?.resolve(0, None).map_err(|_| {
			VmError::NoSuchMethod(format!(
				"method {key:?} in {} has multiple variants, use the full signature",
				self.name(),
			))
		})
	}

	/// All declared methods, flattened across the brokers, optionally
	/// filtered by access flags.
	pub fn get_declared_methods(&self, filter: Option<AccessFlags>) -> Vec<Rc<SmaliMethod>> {
		self.methods.borrow()
			.values()
			.flat_map(|broker| broker.methods().iter().cloned())
			.filter(|x| filter.is_none_or(|flags| x.modifiers().contains(flags)))
			.collect()
	}

	pub fn inner_class(&self, name: &str) -> Result<Rc<SmaliClass>, VmError> {
		self.inner_classes.borrow()
			.get(name)
			.cloned()
			.ok_or_else(|| VmError::NoSuchClass(name.to_owned()))
	}

	pub fn inner_classes(&self) -> Vec<Rc<SmaliClass>> {
		self.inner_classes.borrow().values().cloned().collect()
	}

	pub fn is_interface(&self) -> bool {
		self.modifiers.contains(AccessFlags::INTERFACE)
	}

	pub fn is_abstract(&self) -> bool {
		self.modifiers.contains(AccessFlags::ABSTRACT)
	}

	/// Whether a value of class `other` can stand in for this class:
	/// walks `other`'s super chain up to `java/lang/Object`, resolving
	/// through the registry.
	pub fn is_assignable(&self, other: &Rc<SmaliClass>, vm: &SmaliVm) -> bool {
		let own = self.descriptor();
		if own == other.descriptor() {
			return true;
		}

		let mut super_class = other.super_class();
		while let Some(ty) = super_class {
			let descriptor = ty.descriptor();
			if descriptor == own {
				return true;
			}
			if descriptor == JAVA_LANG_OBJECT {
				return false;
			}
			super_class = match vm.get_class(&descriptor) {
				Ok(class) => class.super_class(),
				Err(_) => return false,
			};
		}
		false
	}

	/// Runs the static block initializer, at most once. A class without
	/// `<clinit>` initializes trivially.
	pub fn clinit(&self, vm: &SmaliVm) -> Result<(), VmError> {
		if self.initialized.replace(true) {
			return Ok(());
		}
		let Ok(broker) = self.broker("<clinit>") else {
			return Ok(());
		};
		let method = broker.resolve(0, None)?;
		vm.call(&method, None, &[])?;
		Ok(())
	}
}

impl Member for SmaliClass {
	fn member_type(&self) -> &Type {
		&self.ty
	}

	fn signature(&self) -> String {
		self.ty.descriptor()
	}

	fn modifiers(&self) -> AccessFlags {
		self.modifiers
	}

	fn declaring_class(&self) -> Option<Rc<SmaliClass>> {
		self.parent.borrow().upgrade()
	}

	fn get_annotations(&self, descriptor: &str) -> Vec<Rc<SmaliAnnotation>> {
		annotations_of(&self.annotations, descriptor)
	}
}

impl Debug for SmaliClass {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SmaliClass {{ {} }}", self.descriptor())
	}
}

/// A live instance of a [`SmaliClass`], holding the values of the
/// non-static fields.
pub struct SmaliObject {
	class: Rc<SmaliClass>,
	fields: RefCell<IndexMap<String, Value>>,
}

impl SmaliObject {
	/// Allocates an instance with all instance fields set to null.
	/// Abstract classes and interfaces cannot be instantiated.
	pub fn new(class: &Rc<SmaliClass>) -> Result<SmaliObject, VmError> {
		if class.is_abstract() || class.is_interface() {
			return Err(VmError::Unsupported(format!(
				"class {} is abstract and cannot be instantiated directly",
				class.name(),
			)));
		}

		let mut fields = IndexMap::new();
		for field in class.fields(None) {
			if !field.is_static() {
				fields.insert(field.name().to_owned(), Value::Null);
			}
		}
		Ok(SmaliObject { class: class.clone(), fields: RefCell::new(fields) })
	}

	pub fn class(&self) -> &Rc<SmaliClass> {
		&self.class
	}

	/// Reads a field value; static fields come from the class level.
	pub fn get(&self, name: &str) -> Result<Value, VmError> {
		let field = self.class.field(name)?;
		if field.is_static() {
			return Ok(field.value());
		}
		self.fields.borrow()
			.get(name)
			.cloned()
			.ok_or_else(|| VmError::NoSuchField(name.to_owned()))
	}

	/// Writes a field value. Final fields are read-only.
	pub fn set(&self, name: &str, value: Value) -> Result<(), VmError> {
		let field = self.class.field(name)?;
		if field.is_final() {
			return Err(VmError::Unsupported(format!(
				"attempt to write in read-only field {}.{name}",
				self.class.name(),
			)));
		}
		if field.is_static() {
			field.set_value(value);
			return Ok(());
		}
		self.fields.borrow_mut().insert(name.to_owned(), value);
		Ok(())
	}

	/// Runs the constructor overload matching the argument count.
	pub fn init(object: &Rc<SmaliObject>, vm: &SmaliVm, args: &[Value]) -> Result<(), VmError> {
		let constructor = object.class.broker("<init>")?.resolve(args.len(), None)?;
		vm.call(&constructor, Some(Value::Object(object.clone())), args)?;
		Ok(())
	}
}

impl Debug for SmaliObject {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SmaliObject {{ type = {} }}", self.class.descriptor())
	}
}
