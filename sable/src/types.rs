use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;
use anyhow::{anyhow, bail, Result};

/// A primitive type, named by its descriptor character.
///
/// `V` (`void`) only makes sense as a return type, but the grammar treats
/// it like the other primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
	/// A `boolean`.
	Z,
	/// A `byte`.
	B,
	/// A `short`.
	S,
	/// A `char`.
	C,
	/// An `int`.
	I,
	/// A `long`.
	J,
	/// A `float`.
	F,
	/// A `double`.
	D,
	/// The `void` pseudo type.
	V,
}

impl Primitive {
	pub fn from_char(char: char) -> Option<Primitive> {
		Some(match char {
			'Z' => Primitive::Z,
			'B' => Primitive::B,
			'S' => Primitive::S,
			'C' => Primitive::C,
			'I' => Primitive::I,
			'J' => Primitive::J,
			'F' => Primitive::F,
			'D' => Primitive::D,
			'V' => Primitive::V,
			_ => return None,
		})
	}

	pub fn as_char(self) -> char {
		match self {
			Primitive::Z => 'Z',
			Primitive::B => 'B',
			Primitive::S => 'S',
			Primitive::C => 'C',
			Primitive::I => 'I',
			Primitive::J => 'J',
			Primitive::F => 'F',
			Primitive::D => 'D',
			Primitive::V => 'V',
		}
	}
}

/// Represents a type as it appears in Smali sources.
///
/// Class names are stored in internal form (no `L`/`;`). Inputs are
/// normalized: `.` becomes `/` and bare class names are accepted.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sable::types::Type;
///
/// let class = Type::parse("com.example.Class").unwrap();
/// assert_eq!(class.descriptor(), "Lcom/example/Class;");
/// assert_eq!(class, Type::parse("Lcom/example/Class;").unwrap());
///
/// let array = Type::parse("[[Lcom/example/Class;").unwrap();
/// assert_eq!(array.dim(), 2);
/// assert_eq!(array.pretty_name(), "com.example.Class[][]");
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Type {
	Primitive(Primitive),
	/// An instance of the class with the given internal name.
	Class(String),
	/// An array type, represented by the dimension and the element type.
	///
	/// The dimension is never zero.
	Array(u8, ArrayType),
	/// A method signature, such as `foo(II)V`.
	Method(Box<MethodSignature>),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ArrayType {
	Primitive(Primitive),
	Class(String),
}

impl Type {
	pub fn parse(input: &str) -> Result<Type> {
		let input = input.trim();
		if input.is_empty() {
			bail!("empty type");
		}
		if input.contains('(') {
			return Ok(Type::Method(Box::new(MethodSignature::parse(input)?)));
		}

		let dim = input.chars().take_while(|&x| x == '[').count();
		let rest = &input[dim..];

		if dim == 0 {
			if let Some(primitive) = single_primitive(rest) {
				Ok(Type::Primitive(primitive))
			} else {
				Ok(Type::Class(class_name(rest)?))
			}
		} else {
			let dim = u8::try_from(dim)
				.map_err(|_| anyhow!("array dimension of {input:?} does not fit"))?;
			if let Some(primitive) = single_primitive(rest) {
				Ok(Type::Array(dim, ArrayType::Primitive(primitive)))
			} else {
				Ok(Type::Array(dim, ArrayType::Class(class_name(rest)?)))
			}
		}
	}

	/// Renders the canonical descriptor, the inverse of [`Type::parse`].
	pub fn descriptor(&self) -> String {
		let mut s = String::new();
		self.write(&mut s);
		s
	}

	fn write(&self, s: &mut String) {
		match self {
			Type::Primitive(primitive) => s.push(primitive.as_char()),
			Type::Class(name) => {
				s.push('L');
				s.push_str(name);
				s.push(';');
			},
			Type::Array(dim, element) => {
				for _ in 0..*dim {
					s.push('[');
				}
				match element {
					ArrayType::Primitive(primitive) => s.push(primitive.as_char()),
					ArrayType::Class(name) => {
						s.push('L');
						s.push_str(name);
						s.push(';');
					},
				}
			},
			Type::Method(signature) => s.push_str(&signature.sig()),
		}
	}

	/// The human readable name: `Lcom/a/B;` becomes `com.a.B`, arrays get
	/// a `[]` suffix per dimension.
	pub fn pretty_name(&self) -> String {
		match self {
			Type::Primitive(primitive) => primitive.as_char().to_string(),
			Type::Class(name) => name.replace('/', "."),
			Type::Array(dim, element) => {
				let element = match element {
					ArrayType::Primitive(primitive) => primitive.as_char().to_string(),
					ArrayType::Class(name) => name.replace('/', "."),
				};
				element + &"[]".repeat(usize::from(*dim))
			},
			Type::Method(signature) => signature.sig(),
		}
	}

	/// The internal name, with `L` and `;` dropped. Arrays report their
	/// element's name.
	pub fn dvm_name(&self) -> String {
		match self {
			Type::Primitive(primitive) => primitive.as_char().to_string(),
			Type::Class(name) => name.clone(),
			Type::Array(_, ArrayType::Primitive(primitive)) => primitive.as_char().to_string(),
			Type::Array(_, ArrayType::Class(name)) => name.clone(),
			Type::Method(signature) => signature.sig(),
		}
	}

	/// The last segment of the pretty name.
	pub fn simple_name(&self) -> String {
		let pretty = self.pretty_name();
		match pretty.rsplit_once('.') {
			Some((_, simple)) => simple.to_owned(),
			None => pretty,
		}
	}

	pub fn dim(&self) -> u8 {
		match self {
			Type::Array(dim, _) => *dim,
			_ => 0,
		}
	}

	/// The element type of an array.
	pub fn array_type(&self) -> Option<Type> {
		match self {
			Type::Array(_, ArrayType::Primitive(primitive)) => Some(Type::Primitive(*primitive)),
			Type::Array(_, ArrayType::Class(name)) => Some(Type::Class(name.clone())),
			_ => None,
		}
	}

	pub fn is_signature(&self) -> bool {
		matches!(self, Type::Method(_))
	}

	pub fn signature(&self) -> Option<&MethodSignature> {
		match self {
			Type::Method(signature) => Some(signature),
			_ => None,
		}
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.descriptor())
	}
}

fn single_primitive(s: &str) -> Option<Primitive> {
	let mut chars = s.chars();
	match (chars.next(), chars.next()) {
		(Some(char), None) => Primitive::from_char(char),
		_ => None,
	}
}

/// Normalizes a class name into internal form.
fn class_name(s: &str) -> Result<String> {
	let inner = match s.strip_prefix('L').and_then(|x| x.strip_suffix(';')) {
		Some(inner) => inner,
		None => s,
	};
	let inner = inner.replace('.', "/");
	if inner.is_empty() || inner.contains(char::is_whitespace) {
		bail!("invalid class name {s:?}");
	}
	Ok(inner)
}

// The grammar for descriptors matches the DEX one:
//   FieldType:
//     "Z" | "B" | "S" | "C" | "I" | "J" | "F" | "D" |
//     "L" ClassName ";" |
//     "[" FieldType
fn read_type(chars: &mut Peekable<Chars>) -> Result<Type> {
	let mut dim = 0u8;
	while chars.next_if_eq(&'[').is_some() {
		dim = dim.checked_add(1)
			.ok_or_else(|| anyhow!("array dimension does not fit"))?;
	}

	let char = chars.next().ok_or_else(|| anyhow!("unexpected abrupt ending of descriptor"))?;

	if char == 'L' {
		let mut name = String::new();
		loop {
			let char = chars.next().ok_or_else(|| anyhow!("unexpected abrupt ending of descriptor"))?;
			if char == ';' {
				break;
			}
			name.push(char);
		}
		if dim == 0 {
			Ok(Type::Class(name))
		} else {
			Ok(Type::Array(dim, ArrayType::Class(name)))
		}
	} else if let Some(primitive) = Primitive::from_char(char) {
		if dim == 0 {
			Ok(Type::Primitive(primitive))
		} else {
			Ok(Type::Array(dim, ArrayType::Primitive(primitive)))
		}
	} else {
		bail!("unexpected char {char:?} in descriptor");
	}
}

/// A parsed method signature.
///
/// Both the owner qualified form `Lcom/a/B;->foo(I)V` and the bare form
/// `foo(I)V` are accepted; `<init>` and `<clinit>` keep their angle
/// brackets.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sable::types::MethodSignature;
///
/// let signature = MethodSignature::parse("<init>(II)V").unwrap();
/// assert_eq!(signature.name(), "<init>");
/// assert_eq!(signature.parameters().len(), 2);
/// assert_eq!(signature.return_type().descriptor(), "V");
/// assert_eq!(signature.descriptor(), "(II)V");
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MethodSignature {
	owner: Option<Type>,
	name: String,
	parameters: Vec<Type>,
	return_type: Type,
}

impl MethodSignature {
	pub fn new(owner: Option<Type>, name: String, parameters: Vec<Type>, return_type: Type) -> MethodSignature {
		MethodSignature { owner, name, parameters, return_type }
	}

	pub fn parse(input: &str) -> Result<MethodSignature> {
		let input = input.trim();
		let (owner, rest) = match input.split_once("->") {
			Some((owner, rest)) => (Some(Type::parse(owner)?), rest),
			None => (None, input),
		};

		let open = rest.find('(')
			.ok_or_else(|| anyhow!("invalid method signature, expected '(' in {input:?}"))?;
		let close = rest.find(')')
			.ok_or_else(|| anyhow!("invalid method signature, expected ')' in {input:?}"))?;
		if close < open {
			bail!("invalid method signature {input:?}");
		}

		let raw_name = &rest[..open];
		if raw_name.is_empty() {
			bail!("invalid method signature, could not find name in {input:?}");
		}
		let name = if raw_name == "<init>" || raw_name == "<clinit>" {
			raw_name.to_owned()
		} else {
			raw_name.trim_start_matches('<').trim_end_matches('>').to_owned()
		};

		let mut parameters = Vec::new();
		let mut chars = rest[open + 1..close].chars().peekable();
		while chars.peek().is_some() {
			parameters.push(read_type(&mut chars)
				.map_err(|e| anyhow!("failed to read parameter of {input:?}: {e}"))?);
		}

		let mut chars = rest[close + 1..].chars().peekable();
		let return_type = read_type(&mut chars)
			.map_err(|e| anyhow!("failed to read return type of {input:?}: {e}"))?;
		if chars.peek().is_some() {
			bail!("expected end of method signature {input:?}");
		}

		Ok(MethodSignature { owner, name, parameters, return_type })
	}

	/// The declaring class, when the qualified form was used.
	pub fn owner(&self) -> Option<&Type> {
		self.owner.as_ref()
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

	/// The `(parameters)return` tail of the signature.
	pub fn descriptor(&self) -> String {
		let mut s = String::from("(");
		for parameter in &self.parameters {
			parameter.write(&mut s);
		}
		s.push(')');
		self.return_type.write(&mut s);
		s
	}

	/// The name plus descriptor, without the owner.
	pub fn name_and_descriptor(&self) -> String {
		format!("{}{}", self.name, self.descriptor())
	}

	/// The full signature string, including the owner if one is known.
	pub fn sig(&self) -> String {
		match &self.owner {
			Some(owner) => format!("{}->{}{}", owner.descriptor(), self.name, self.descriptor()),
			None => self.name_and_descriptor(),
		}
	}
}

impl Display for MethodSignature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.sig())
	}
}

/// Returns whether the given value is a valid type descriptor.
pub fn is_type_descriptor(value: &str) -> bool {
	let rest = value.trim_start_matches('[');
	if let Some(primitive) = rest.chars().next() {
		if rest.len() == 1 {
			return Primitive::from_char(primitive).is_some();
		}
	}
	rest.len() > 2
		&& rest.starts_with('L')
		&& rest.ends_with(';')
		&& !rest.contains(char::is_whitespace)
}

/// A decoded Smali literal.
///
/// Numeric literals carry the DEX suffixes (`t` byte, `s` short, `l`
/// long), may be signed, and may be hexadecimal with `0x`. Strings decode
/// their escapes, including `\uXXXX`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Int(i64),
	Float(f64),
	Bool(bool),
	Char(char),
	String(String),
	Type(Type),
}

impl Literal {
	/// Decodes a literal, trying the recognizers in a fixed order:
	/// short, long, byte, int, boolean, float, double, char, string and
	/// finally type descriptors.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// use sable::types::Literal;
	///
	/// assert_eq!(Literal::parse("0x10").unwrap(), Literal::Int(16));
	/// assert_eq!(Literal::parse("10s").unwrap(), Literal::Int(10));
	/// assert_eq!(Literal::parse("1.5f").unwrap(), Literal::Float(1.5));
	/// assert_eq!(Literal::parse("\"ab\"").unwrap(), Literal::String("ab".to_owned()));
	/// assert_eq!(Literal::parse("true").unwrap(), Literal::Bool(true));
	/// ```
	pub fn parse(value: &str) -> Result<Literal> {
		let value = value.trim();

		for suffix in ['s', 'l', 't'] {
			if let Some(rest) = value.strip_suffix(suffix) {
				if let Some(int) = parse_int(rest) {
					return Ok(Literal::Int(int));
				}
			}
		}
		if let Some(int) = parse_int(value) {
			return Ok(Literal::Int(int));
		}
		if value == "true" {
			return Ok(Literal::Bool(true));
		}
		if value == "false" {
			return Ok(Literal::Bool(false));
		}
		if let Some(rest) = value.strip_suffix('f') {
			if let Some(float) = parse_float(rest) {
				return Ok(Literal::Float(float));
			}
		}
		if let Some(float) = parse_float(value) {
			return Ok(Literal::Float(float));
		}
		if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
			let inner = unescape(&value[1..value.len() - 1]);
			let mut chars = inner.chars();
			return match (chars.next(), chars.next()) {
				(Some(char), None) => Ok(Literal::Char(char)),
				_ => Err(anyhow!("invalid char literal {value:?}")),
			};
		}
		if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
			return Ok(Literal::String(unescape(&value[1..value.len() - 1])));
		}
		if is_type_descriptor(value) {
			return Ok(Literal::Type(Type::parse(value)?));
		}

		bail!("could not find any matching literal form for {value:?}")
	}
}

impl Display for Literal {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Literal::Int(int) => write!(f, "{int}"),
			Literal::Float(float) => {
				if float.fract() == 0.0 && float.is_finite() {
					write!(f, "{float:.1}")
				} else {
					write!(f, "{float}")
				}
			},
			Literal::Bool(bool) => write!(f, "{bool}"),
			Literal::Char(char) => write!(f, "'{char}'"),
			Literal::String(string) => write!(f, "\"{}\"", escape(string)),
			Literal::Type(ty) => f.write_str(&ty.descriptor()),
		}
	}
}

fn parse_int(text: &str) -> Option<i64> {
	let (negative, rest) = match text.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, text.strip_prefix('+').unwrap_or(text)),
	};

	let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
		if hex.is_empty() || !hex.chars().all(|x| x.is_ascii_hexdigit()) {
			return None;
		}
		// 64 bit wide constants use the whole u64 range
		u64::from_str_radix(hex, 16).ok()? as i64
	} else {
		if rest.is_empty() || !rest.chars().all(|x| x.is_ascii_digit()) {
			return None;
		}
		rest.parse::<i64>().ok()?
	};

	Some(if negative { value.wrapping_neg() } else { value })
}

fn parse_float(text: &str) -> Option<f64> {
	let rest = text.strip_prefix(['-', '+']).unwrap_or(text);
	let (whole, fraction) = rest.split_once('.')?;
	if whole.is_empty() || fraction.is_empty() {
		return None;
	}
	if !whole.chars().all(|x| x.is_ascii_digit()) || !fraction.chars().all(|x| x.is_ascii_digit()) {
		return None;
	}
	text.parse().ok()
}

fn unescape(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	let mut chars = text.chars();
	while let Some(char) = chars.next() {
		if char != '\\' {
			result.push(char);
			continue;
		}
		match chars.next() {
			Some('n') => result.push('\n'),
			Some('r') => result.push('\r'),
			Some('t') => result.push('\t'),
			Some('0') => result.push('\0'),
			Some('\\') => result.push('\\'),
			Some('"') => result.push('"'),
			Some('\'') => result.push('\''),
			Some('u') => {
				let digits: String = chars.by_ref().take(4).collect();
				match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
					Some(decoded) => result.push(decoded),
					None => {
						result.push_str("\\u");
						result.push_str(&digits);
					},
				}
			},
			Some(other) => {
				result.push('\\');
				result.push(other);
			},
			None => result.push('\\'),
		}
	}
	result
}

fn escape(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	for char in text.chars() {
		match char {
			'\n' => result.push_str("\\n"),
			'\r' => result.push_str("\\r"),
			'\t' => result.push_str("\\t"),
			'\0' => result.push_str("\\0"),
			'\\' => result.push_str("\\\\"),
			'"' => result.push_str("\\\""),
			_ => result.push(char),
		}
	}
	result
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use anyhow::Result;
	use super::{is_type_descriptor, Literal, MethodSignature, Primitive, Type};

	#[test]
	fn parse_and_render() -> Result<()> {
		assert_eq!(Type::parse("I")?, Type::Primitive(Primitive::I));
		assert_eq!(Type::parse("I")?.descriptor(), "I");

		assert_eq!(Type::parse("Ljava/lang/Object;")?.descriptor(), "Ljava/lang/Object;");
		assert_eq!(Type::parse("java/lang/Object")?.descriptor(), "Ljava/lang/Object;");
		assert_eq!(Type::parse("java.lang.Object")?.descriptor(), "Ljava/lang/Object;");

		assert_eq!(Type::parse("[[B")?.descriptor(), "[[B");
		assert_eq!(Type::parse("[Lcom/a/B;")?.descriptor(), "[Lcom/a/B;");
		Ok(())
	}

	#[test]
	fn names() -> Result<()> {
		let class = Type::parse("Lcom/example/Class;")?;
		assert_eq!(class.pretty_name(), "com.example.Class");
		assert_eq!(class.dvm_name(), "com/example/Class");
		assert_eq!(class.simple_name(), "Class");

		let array = Type::parse("[[Lcom/a/B;")?;
		assert_eq!(array.pretty_name(), "com.a.B[][]");
		assert_eq!(array.dvm_name(), "com/a/B");
		assert_eq!(array.dim(), 2);
		Ok(())
	}

	#[test]
	fn signatures() -> Result<()> {
		let signature = MethodSignature::parse("<init>(II)V")?;
		assert_eq!(signature.name(), "<init>");
		assert_eq!(
			signature.parameters(),
			&[Type::Primitive(Primitive::I), Type::Primitive(Primitive::I)],
		);
		assert_eq!(signature.return_type(), &Type::Primitive(Primitive::V));
		assert!(signature.owner().is_none());

		let qualified = MethodSignature::parse("Lcom/a/B;->foo(Ljava/lang/String;)I")?;
		assert_eq!(qualified.owner().map(Type::pretty_name), Some("com.a.B".to_owned()));
		assert_eq!(qualified.name(), "foo");
		assert_eq!(qualified.descriptor(), "(Ljava/lang/String;)I");
		Ok(())
	}

	#[test]
	fn signature_err() {
		assert!(MethodSignature::parse("foo").is_err());
		assert!(MethodSignature::parse("(II)V").is_err());
		assert!(MethodSignature::parse("foo(Lcom/a/B)V").is_err());
	}

	#[test]
	fn literals() -> Result<()> {
		assert_eq!(Literal::parse("0x10")?, Literal::Int(16));
		assert_eq!(Literal::parse("-0x1")?, Literal::Int(-1));
		assert_eq!(Literal::parse("10s")?, Literal::Int(10));
		assert_eq!(Literal::parse("42l")?, Literal::Int(42));
		assert_eq!(Literal::parse("7t")?, Literal::Int(7));
		assert_eq!(Literal::parse("1.5f")?, Literal::Float(1.5));
		assert_eq!(Literal::parse("2.25")?, Literal::Float(2.25));
		assert_eq!(Literal::parse("true")?, Literal::Bool(true));
		assert_eq!(Literal::parse("'x'")?, Literal::Char('x'));
		assert_eq!(Literal::parse("\"ab\"")?, Literal::String("ab".to_owned()));
		assert_eq!(Literal::parse("\"a\\u0062\"")?, Literal::String("ab".to_owned()));
		assert_eq!(Literal::parse("Ljava/lang/String;")?, Literal::Type(Type::parse("Ljava/lang/String;")?));
		assert!(Literal::parse("{}").is_err());
		Ok(())
	}

	#[test]
	fn descriptors() {
		assert!(is_type_descriptor("I"));
		assert!(is_type_descriptor("[[Z"));
		assert!(is_type_descriptor("Ljava/lang/String;"));
		assert!(is_type_descriptor("[Lcom/a/B;"));
		assert!(!is_type_descriptor("Ljava lang;"));
		assert!(!is_type_descriptor("com/a/B"));
		assert!(!is_type_descriptor("X"));
	}
}
