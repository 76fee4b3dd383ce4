//! Re-emits visitor events as canonical Smali text.
//!
//! [`SmaliWriter`] implements the visitor traits, so it can be fed
//! directly by [`crate::reader::SmaliReader`] or by any other event
//! source. Output is canonical: one directive per line, four spaces of
//! indentation per nesting scope, blank lines between member blocks.

use anyhow::Result;
use crate::flags::AccessFlags;
use crate::types::{Literal, MethodSignature, Type};
use crate::visitor::annotation::AnnotationVisitor;
use crate::visitor::class::ClassVisitor;
use crate::visitor::field::FieldVisitor;
use crate::visitor::method::MethodVisitor;

const INDENT: &str = "    ";

/// The line buffer of one writer scope. Nested scopes build their own
/// cache, spliced into the parent when the scope finishes.
#[derive(Debug, Default)]
struct CodeCache {
	lines: Vec<String>,
	indent: usize,
}

impl CodeCache {
	fn new(indent: usize) -> CodeCache {
		CodeCache { lines: Vec::new(), indent }
	}

	fn push(&mut self, line: impl AsRef<str>) {
		self.push_at(self.indent, line);
	}

	fn push_at(&mut self, indent: usize, line: impl AsRef<str>) {
		self.lines.push(format!("{}{}", INDENT.repeat(indent), line.as_ref()));
	}

	/// A single blank separator, never two in a row.
	fn blank(&mut self) {
		if self.lines.last().is_some_and(|x| !x.is_empty()) {
			self.lines.push(String::new());
		}
	}

	fn append_eol_comment(&mut self, text: &str) {
		if let Some(last) = self.lines.last_mut() {
			last.push_str(" # ");
			last.push_str(text);
		}
	}

	fn extend(&mut self, other: CodeCache) {
		self.lines.extend(other.lines);
	}
}

fn declaration(keyword: &str, flags: AccessFlags, rest: &str) -> String {
	if flags.is_empty() {
		format!("{keyword} {rest}")
	} else {
		format!("{keyword} {flags} {rest}")
	}
}

/// Writes a class scope.
#[derive(Debug, Default)]
pub struct SmaliWriter {
	cache: CodeCache,
}

impl SmaliWriter {
	pub fn new() -> SmaliWriter {
		SmaliWriter { cache: CodeCache::new(0) }
	}

	/// The emitted source, with a trailing newline.
	pub fn code(&self) -> String {
		let mut code = self.cache.lines.join("\n");
		code.push('\n');
		code
	}
}

impl ClassVisitor for SmaliWriter {
	type Annotation = AnnotationWriter;
	type Field = FieldWriter;
	type Method = MethodWriter;
	type Inner = SmaliWriter;

	fn visit_class(&mut self, name: &Type, access: AccessFlags) -> Result<()> {
		self.cache.push(declaration(".class", access, &name.descriptor()));
		Ok(())
	}

	fn visit_super(&mut self, super_class: &Type) -> Result<()> {
		self.cache.push(format!(".super {super_class}"));
		Ok(())
	}

	fn visit_implements(&mut self, interface: &Type) -> Result<()> {
		self.cache.push(format!(".implements {interface}"));
		Ok(())
	}

	fn visit_source(&mut self, source: &str) -> Result<()> {
		self.cache.push(format!(".source \"{source}\""));
		Ok(())
	}

	fn visit_debug(&mut self, enabled: bool) -> Result<()> {
		self.cache.push(format!(".debug {}", u8::from(enabled)));
		Ok(())
	}

	fn visit_field(&mut self, access: AccessFlags, name: &str, descriptor: &Type, value: Option<&str>) -> Result<Option<FieldWriter>> {
		let mut line = declaration(".field", access, &format!("{name}:{descriptor}"));
		if let Some(value) = value {
			line.push_str(" = ");
			line.push_str(value);
		}
		Ok(Some(FieldWriter::new(self.cache.indent, line)))
	}

	fn finish_field(&mut self, field: FieldWriter) -> Result<()> {
		self.cache.blank();
		self.cache.extend(field.cache);
		Ok(())
	}

	fn visit_method(&mut self, access: AccessFlags, signature: &MethodSignature) -> Result<Option<MethodWriter>> {
		let line = declaration(".method", access, &signature.name_and_descriptor());
		Ok(Some(MethodWriter::new(self.cache.indent, line)))
	}

	fn finish_method(&mut self, method: MethodWriter) -> Result<()> {
		self.cache.blank();
		self.cache.extend(method.cache);
		Ok(())
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationWriter>> {
		let line = declaration(".annotation", access, &descriptor.descriptor());
		Ok(Some(AnnotationWriter::new(self.cache.indent, line, "annotation")))
	}

	fn finish_annotation(&mut self, annotation: AnnotationWriter) -> Result<()> {
		self.cache.blank();
		self.cache.extend(annotation.cache);
		Ok(())
	}

	fn visit_inner_class(&mut self, name: &Type, access: AccessFlags) -> Result<Option<SmaliWriter>> {
		let mut inner = SmaliWriter::new();
		inner.cache.push(declaration(".class", access, &name.descriptor()));
		Ok(Some(inner))
	}

	fn finish_inner_class(&mut self, inner: SmaliWriter) -> Result<()> {
		self.cache.blank();
		self.cache.extend(inner.cache);
		Ok(())
	}

	fn visit_comment(&mut self, text: &str) -> Result<()> {
		self.cache.push(format!("# {text}"));
		Ok(())
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.cache.append_eol_comment(text);
		Ok(())
	}
}

/// Writes a `.field` block. The closing `.end field` only appears when
/// the source had one.
#[derive(Debug)]
pub struct FieldWriter {
	cache: CodeCache,
}

impl FieldWriter {
	fn new(indent: usize, declaration: String) -> FieldWriter {
		let mut cache = CodeCache::new(indent);
		cache.push(declaration);
		FieldWriter { cache }
	}
}

impl FieldVisitor for FieldWriter {
	type Annotation = AnnotationWriter;

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationWriter>> {
		let line = declaration(".annotation", access, &descriptor.descriptor());
		Ok(Some(AnnotationWriter::new(self.cache.indent + 1, line, "annotation")))
	}

	fn finish_annotation(&mut self, annotation: AnnotationWriter) -> Result<()> {
		self.cache.extend(annotation.cache);
		Ok(())
	}

	fn visit_comment(&mut self, text: &str) -> Result<()> {
		self.cache.push(format!("# {text}"));
		Ok(())
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.cache.append_eol_comment(text);
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.cache.push(".end field");
		Ok(())
	}
}

/// Writes a `.method` block.
#[derive(Debug)]
pub struct MethodWriter {
	cache: CodeCache,
	indent: usize,
}

impl MethodWriter {
	fn new(indent: usize, declaration: String) -> MethodWriter {
		let mut cache = CodeCache::new(indent + 1);
		cache.push_at(indent, declaration);
		MethodWriter { cache, indent }
	}
}

impl MethodVisitor for MethodWriter {
	type Annotation = AnnotationWriter;

	fn visit_param(&mut self, register: &str, name: &str) -> Result<()> {
		if name.is_empty() {
			self.cache.push(format!(".param {register}"));
		} else {
			self.cache.push(format!(".param {register}, \"{name}\""));
		}
		Ok(())
	}

	fn visit_locals(&mut self, count: usize) -> Result<()> {
		self.cache.push(format!(".locals {count}"));
		Ok(())
	}

	fn visit_registers(&mut self, count: usize) -> Result<()> {
		self.cache.push(format!(".registers {count}"));
		Ok(())
	}

	fn visit_line(&mut self, number: usize) -> Result<()> {
		self.cache.push(format!(".line {number}"));
		Ok(())
	}

	fn visit_prologue(&mut self) -> Result<()> {
		self.cache.push(".prologue");
		Ok(())
	}

	fn visit_block(&mut self, label: &str) -> Result<()> {
		self.cache.push(format!(":{label}"));
		Ok(())
	}

	fn visit_goto(&mut self, label: &str) -> Result<()> {
		self.cache.push(format!("goto :{label}"));
		Ok(())
	}

	fn visit_invoke(&mut self, kind: &str, registers: &[String], owner: &Type, method: &str) -> Result<()> {
		self.cache.push(format!(
			"invoke-{kind} {{{}}}, {owner}->{method}",
			registers.join(", "),
		));
		Ok(())
	}

	fn visit_return(&mut self, kind: &str, args: &[String]) -> Result<()> {
		let name = if kind.is_empty() {
			"return".to_owned()
		} else {
			format!("return-{kind}")
		};
		if args.is_empty() {
			self.cache.push(name);
		} else {
			self.cache.push(format!("{name} {}", args.join(", ")));
		}
		Ok(())
	}

	fn visit_instruction(&mut self, name: &str, args: &[String]) -> Result<()> {
		if args.is_empty() {
			self.cache.push(name);
		} else {
			self.cache.push(format!("{name} {}", args.join(", ")));
		}
		Ok(())
	}

	fn visit_catch(&mut self, exception: &Type, start: &str, end: &str, handler: &str) -> Result<()> {
		self.cache.push(format!(".catch {exception} {{:{start} .. :{end}}} :{handler}"));
		Ok(())
	}

	fn visit_catchall(&mut self, start: &str, end: &str, handler: &str) -> Result<()> {
		self.cache.push(format!(".catchall {{:{start} .. :{end}}} :{handler}"));
		Ok(())
	}

	fn visit_packed_switch(&mut self, base: &str, targets: &[String]) -> Result<()> {
		self.cache.push(format!(".packed-switch {base}"));
		for target in targets {
			self.cache.push_at(self.indent + 2, format!(":{target}"));
		}
		self.cache.push(".end packed-switch");
		Ok(())
	}

	fn visit_sparse_switch(&mut self, branches: &[(String, String)]) -> Result<()> {
		self.cache.push(".sparse-switch");
		for (key, label) in branches {
			self.cache.push_at(self.indent + 2, format!("{key} -> :{label}"));
		}
		self.cache.push(".end sparse-switch");
		Ok(())
	}

	fn visit_array_data(&mut self, width: &str, values: &[Literal]) -> Result<()> {
		self.cache.push(format!(".array-data {width}"));
		for value in values {
			self.cache.push_at(self.indent + 2, value.to_string());
		}
		self.cache.push(".end array-data");
		Ok(())
	}

	fn visit_local(&mut self, register: &str, name: &str, descriptor: &str, full_descriptor: Option<&str>) -> Result<()> {
		let mut line = format!(".local {register}, \"{name}\":{descriptor}");
		if let Some(full) = full_descriptor {
			line.push_str(", ");
			line.push_str(full);
		}
		self.cache.push(line);
		Ok(())
	}

	fn visit_restart(&mut self, register: &str) -> Result<()> {
		self.cache.push(format!(".restart local {register}"));
		Ok(())
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationWriter>> {
		let line = declaration(".annotation", access, &descriptor.descriptor());
		Ok(Some(AnnotationWriter::new(self.cache.indent, line, "annotation")))
	}

	fn finish_annotation(&mut self, annotation: AnnotationWriter) -> Result<()> {
		self.cache.extend(annotation.cache);
		Ok(())
	}

	fn visit_comment(&mut self, text: &str) -> Result<()> {
		self.cache.push(format!("# {text}"));
		Ok(())
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.cache.append_eol_comment(text);
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.cache.push_at(self.indent, ".end method");
		Ok(())
	}
}

/// Writes an `.annotation` or `.subannotation` block.
#[derive(Debug)]
pub struct AnnotationWriter {
	cache: CodeCache,
	token: &'static str,
}

impl AnnotationWriter {
	fn new(indent: usize, declaration: String, token: &'static str) -> AnnotationWriter {
		let mut cache = CodeCache::new(indent);
		cache.push(declaration);
		AnnotationWriter { cache, token }
	}
}

impl AnnotationVisitor for AnnotationWriter {
	type Sub = AnnotationWriter;

	fn visit_value(&mut self, name: &str, value: &str) -> Result<()> {
		self.cache.push_at(self.cache.indent + 1, format!("{name} = {value}"));
		Ok(())
	}

	fn visit_array(&mut self, name: &str, values: &[String]) -> Result<()> {
		let indent = self.cache.indent;
		if values.is_empty() {
			self.cache.push_at(indent + 1, format!("{name} = {{}}"));
			return Ok(());
		}
		self.cache.push_at(indent + 1, format!("{name} = {{"));
		for (index, value) in values.iter().enumerate() {
			if index + 1 < values.len() {
				self.cache.push_at(indent + 2, format!("{value},"));
			} else {
				self.cache.push_at(indent + 2, value);
			}
		}
		self.cache.push_at(indent + 1, "}");
		Ok(())
	}

	fn visit_enum(&mut self, name: &str, owner: &Type, const_name: &str, const_type: &Type) -> Result<()> {
		self.cache.push_at(
			self.cache.indent + 1,
			format!("{name} = .enum {owner}->{const_name}:{const_type}"),
		);
		Ok(())
	}

	fn visit_subannotation(&mut self, name: &str, access: AccessFlags, descriptor: &Type) -> Result<Option<AnnotationWriter>> {
		let line = declaration(&format!("{name} = .subannotation"), access, &descriptor.descriptor());
		Ok(Some(AnnotationWriter::new(self.cache.indent + 1, line, "subannotation")))
	}

	fn finish_subannotation(&mut self, _name: &str, sub: AnnotationWriter) -> Result<()> {
		self.cache.extend(sub.cache);
		Ok(())
	}

	fn visit_comment(&mut self, text: &str) -> Result<()> {
		self.cache.push(format!("# {text}"));
		Ok(())
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.cache.append_eol_comment(text);
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		let token = self.token;
		self.cache.push(format!(".end {token}"));
		Ok(())
	}
}
