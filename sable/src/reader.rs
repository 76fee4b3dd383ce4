//! The line based Smali source parser.
//!
//! [`SmaliReader`] walks a source one line at a time and dispatches
//! semantic events into a [`ClassVisitor`]. The scope grammar (class >
//! field / method > annotation > subannotation) is handled by recursive
//! descent; the original grammar's visitor stack is the call stack here.

use anyhow::Result;
use thiserror::Error;
use crate::flags::AccessFlags;
use crate::line::Line;
use crate::opcode;
use crate::types::{is_type_descriptor, Literal, MethodSignature, Type};
use crate::visitor::{AnnotationVisitor, ClassVisitor, FieldVisitor, MethodVisitor};

/// A violation of the Smali grammar.
#[derive(Debug, Error)]
#[error("syntax error: {0}")]
pub struct SyntaxError(pub String);

fn syntax(message: impl Into<String>) -> anyhow::Error {
	SyntaxError(message.into()).into()
}

/// How the reader treats an unexpected end of line inside a directive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ErrorMode {
	#[default]
	Strict,
	Ignore,
}

/// The scope a copied line came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Scope {
	Class,
	Field,
	Method,
	Annotation,
}

/// Receives the raw lines no visitor consumed: blank lines, and the
/// contents of declined scopes.
pub trait CopyHandler {
	fn copy(&mut self, line: &str, scope: Scope) -> Result<()>;
}

impl<F: FnMut(&str, Scope) -> Result<()>> CopyHandler for F {
	fn copy(&mut self, line: &str, scope: Scope) -> Result<()> {
		self(line, scope)
	}
}

/// The directive set. Unknown directives are an error, there is no
/// fallback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Directive {
	Annotation,
	ArrayData,
	Catch,
	Catchall,
	Class,
	Debug,
	End,
	Enum,
	Field,
	Implements,
	Line,
	Local,
	Locals,
	Method,
	PackedSwitch,
	Param,
	Prologue,
	Registers,
	Restart,
	Source,
	SparseSwitch,
	Subannotation,
	Super,
}

impl Directive {
	fn from_name(name: &str) -> Option<Directive> {
		Some(match name {
			"annotation" => Directive::Annotation,
			"array-data" => Directive::ArrayData,
			"catch" => Directive::Catch,
			"catchall" => Directive::Catchall,
			"class" => Directive::Class,
			"debug" => Directive::Debug,
			"end" => Directive::End,
			"enum" => Directive::Enum,
			"field" => Directive::Field,
			"implements" => Directive::Implements,
			"line" => Directive::Line,
			"local" => Directive::Local,
			"locals" => Directive::Locals,
			"method" => Directive::Method,
			"packed-switch" => Directive::PackedSwitch,
			"param" | "parameter" => Directive::Param,
			"prologue" => Directive::Prologue,
			"registers" => Directive::Registers,
			"restart" => Directive::Restart,
			"source" => Directive::Source,
			"sparse-switch" => Directive::SparseSwitch,
			"subannotation" => Directive::Subannotation,
			"super" => Directive::Super,
			_ => return None,
		})
	}
}

/// A line based Smali source parser.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sable::reader::SmaliReader;
/// use sable::writer::SmaliWriter;
///
/// let source = "\
/// .class public Lcom/example/A;
/// .super Ljava/lang/Object;
/// ";
///
/// let mut writer = SmaliWriter::new();
/// SmaliReader::new().visit(source, &mut writer).unwrap();
/// assert!(writer.code().starts_with(".class public Lcom/example/A;"));
/// ```
#[derive(Debug, Clone)]
pub struct SmaliReader {
	validate: bool,
	comments: bool,
	snippet: bool,
	errors: ErrorMode,
}

impl Default for SmaliReader {
	fn default() -> SmaliReader {
		SmaliReader::new()
	}
}

impl SmaliReader {
	pub fn new() -> SmaliReader {
		SmaliReader {
			validate: true,
			comments: false,
			snippet: false,
			errors: ErrorMode::Strict,
		}
	}

	/// Fail on malformed descriptors instead of passing them through.
	pub fn validate(mut self, validate: bool) -> SmaliReader {
		self.validate = validate;
		self
	}

	/// Forward `#` comments as events instead of discarding them.
	pub fn comments(mut self, comments: bool) -> SmaliReader {
		self.comments = comments;
		self
	}

	/// Skip the initial `.class` directive, for parsing snippets typed
	/// at a shell.
	pub fn snippet(mut self, snippet: bool) -> SmaliReader {
		self.snippet = snippet;
		self
	}

	pub fn errors(mut self, errors: ErrorMode) -> SmaliReader {
		self.errors = errors;
		self
	}

	/// Parses the source, dispatching events into the visitor.
	pub fn visit<V: ClassVisitor>(&self, source: &str, visitor: &mut V) -> Result<()> {
		self.drive(source, visitor, None)
	}

	/// Like [`SmaliReader::visit`], with a handler receiving every line
	/// no visitor consumed.
	pub fn visit_with_copy<V: ClassVisitor>(&self, source: &str, visitor: &mut V, copy: &mut dyn CopyHandler) -> Result<()> {
		self.drive(source, visitor, Some(copy))
	}

	fn drive<'a, V: ClassVisitor>(&'a self, source: &'a str, visitor: &mut V, copy: Option<&'a mut dyn CopyHandler>) -> Result<()> {
		let mut parsing = Parsing {
			options: self,
			lines: source.lines(),
			pending: None,
			copy,
		};

		if !self.snippet && !parsing.class_definition(visitor)? {
			return Ok(());
		}
		parsing.class_body(Some(visitor))
	}
}

struct Parsing<'a> {
	options: &'a SmaliReader,
	lines: std::str::Lines<'a>,
	pending: Option<Line>,
	copy: Option<&'a mut dyn CopyHandler>,
}

impl Parsing<'_> {
	fn next_line(&mut self) -> Option<Line> {
		if let Some(line) = self.pending.take() {
			return Some(line);
		}
		self.lines.next().map(Line::new)
	}

	fn push_back(&mut self, line: Line) {
		self.pending = Some(line);
	}

	fn copy_line(&mut self, line: &Line, scope: Scope) -> Result<()> {
		if let Some(copy) = self.copy.as_mut() {
			copy.copy(line.raw(), scope)?;
		}
		Ok(())
	}

	fn unexpected_eol(&self, line: &Line) -> anyhow::Error {
		syntax(format!("unexpected end of line: {:?}", line.raw()))
	}

	/// The next token; `None` when the line ended early and the error
	/// mode tolerates that.
	fn token_or_eol(&self, line: &mut Line) -> Result<Option<String>> {
		match line.next() {
			Ok(token) => Ok(Some(token)),
			Err(_) => match self.options.errors {
				ErrorMode::Strict => Err(self.unexpected_eol(line)),
				ErrorMode::Ignore => Ok(None),
			},
		}
	}

	fn validate_descriptor(&self, descriptor: &str) -> Result<()> {
		if self.options.validate && !is_type_descriptor(descriptor) {
			return Err(syntax(format!("expected type descriptor - got {descriptor:?}")));
		}
		Ok(())
	}

	/// Parses the leading `.class` line. Returns false when the source
	/// held no class definition at all (tolerated without validation).
	fn class_definition<V: ClassVisitor>(&mut self, visitor: &mut V) -> Result<bool> {
		loop {
			let Some(mut line) = self.next_line() else {
				if self.options.validate {
					return Err(syntax("expected a class definition - got end of input".to_owned()));
				}
				return Ok(false);
			};

			if line.is_empty() {
				match line.eol_comment() {
					Some(text) => if self.options.comments {
						visitor.visit_comment(text)?;
					},
					None => self.copy_line(&line, Scope::Class)?,
				}
				continue;
			}

			let token = line.next()?;
			if self.options.validate && token != ".class" {
				return Err(syntax(format!("expected '.class' - got {token:?}")));
			}

			let flags = read_access_flags(&mut line);
			let Some(name) = self.token_or_eol(&mut line)? else {
				// tolerated, the rest of the input is still parsed
				return Ok(true);
			};
			self.validate_descriptor(&name)?;
			let name = Type::parse(&name)?;

			visitor.visit_class(&name, flags)?;
			if let Some(text) = line.eol_comment() {
				visitor.visit_eol_comment(text)?;
			}
			return Ok(true);
		}
	}

	fn class_body<V: ClassVisitor>(&mut self, mut visitor: Option<&mut V>) -> Result<()> {
		loop {
			let Some(mut line) = self.next_line() else {
				// end of input closes the deepest class scope
				if let Some(v) = visitor.as_mut() {
					v.visit_end()?;
				}
				return Ok(());
			};

			if line.is_empty() {
				match line.eol_comment() {
					Some(text) => if self.options.comments {
						match visitor.as_mut() {
							Some(v) => v.visit_comment(text)?,
							None => self.copy_line(&line, Scope::Class)?,
						}
					},
					None => self.copy_line(&line, Scope::Class)?,
				}
				continue;
			}

			let first = line.peek().unwrap_or_default().to_owned();
			if !first.starts_with('.') {
				return Err(syntax(format!("invalid statement: {:?}", line.raw())));
			}
			let directive = Directive::from_name(&first[1..])
				.ok_or_else(|| syntax(format!("invalid token: {first:?} - not implemented")))?;

			match directive {
				Directive::Class => {
					// a nested class definition takes over the rest of
					// the input
					line.next()?;
					let flags = read_access_flags(&mut line);
					let Some(name) = self.token_or_eol(&mut line)? else { continue };
					self.validate_descriptor(&name)?;
					let name = Type::parse(&name)?;

					let mut inner: Option<V::Inner> = match visitor.as_mut() {
						Some(v) => v.visit_inner_class(&name, flags)?,
						None => None,
					};
					match (inner.as_mut(), line.eol_comment()) {
						(Some(i), Some(text)) => i.visit_eol_comment(text)?,
						(None, _) => self.copy_line(&line, Scope::Class)?,
						_ => {},
					}

					self.class_body(inner.as_mut())?;
					if let (Some(inner), Some(v)) = (inner, visitor.as_mut()) {
						v.finish_inner_class(inner)?;
					}
					return Ok(());
				},
				Directive::Super => {
					line.next()?;
					let Some(name) = self.token_or_eol(&mut line)? else { continue };
					if !is_type_descriptor(&name) {
						return Err(syntax(format!("expected super-class type descriptor - got {name:?}")));
					}
					match visitor.as_mut() {
						Some(v) => {
							v.visit_super(&Type::parse(&name)?)?;
							if let Some(text) = line.eol_comment() {
								v.visit_eol_comment(text)?;
							}
						},
						None => self.copy_line(&line, Scope::Class)?,
					}
				},
				Directive::Implements => {
					line.next()?;
					let Some(name) = self.token_or_eol(&mut line)? else { continue };
					self.validate_descriptor(&name)?;
					match visitor.as_mut() {
						Some(v) => {
							v.visit_implements(&Type::parse(&name)?)?;
							if let Some(text) = line.eol_comment() {
								v.visit_eol_comment(text)?;
							}
						},
						None => self.copy_line(&line, Scope::Class)?,
					}
				},
				Directive::Source => {
					line.next()?;
					let Some(source) = self.token_or_eol(&mut line)? else { continue };
					let source = source.replace('"', "");
					match visitor.as_mut() {
						Some(v) => {
							v.visit_source(&source)?;
							if let Some(text) = line.eol_comment() {
								v.visit_eol_comment(text)?;
							}
						},
						None => self.copy_line(&line, Scope::Class)?,
					}
				},
				Directive::Debug => {
					line.next()?;
					let Some(enabled) = self.token_or_eol(&mut line)? else { continue };
					let enabled: i64 = enabled.parse()
						.map_err(|_| syntax(format!("expected a number - got {enabled:?}")))?;
					match visitor.as_mut() {
						Some(v) => {
							v.visit_debug(enabled != 0)?;
							if let Some(text) = line.eol_comment() {
								v.visit_eol_comment(text)?;
							}
						},
						None => self.copy_line(&line, Scope::Class)?,
					}
				},
				Directive::Field => self.field(&mut line, &mut visitor)?,
				Directive::Method => self.method(&mut line, &mut visitor)?,
				Directive::Annotation => {
					let Some((flags, descriptor)) = self.annotation_declaration(&mut line)? else { continue };
					let mut annotation: Option<V::Annotation> = match visitor.as_mut() {
						Some(v) => v.visit_annotation(flags, &descriptor)?,
						None => None,
					};
					match (annotation.as_mut(), line.eol_comment()) {
						(Some(a), Some(text)) => a.visit_eol_comment(text)?,
						(None, _) => self.copy_line(&line, Scope::Class)?,
						_ => {},
					}
					let ended = self.annotation_body(annotation.as_mut(), "annotation")?;
					if let Some(a) = annotation.as_mut() {
						if ended {
							a.visit_end()?;
						}
					}
					if let (Some(annotation), Some(v)) = (annotation, visitor.as_mut()) {
						v.finish_annotation(annotation)?;
					}
				},
				_ => return Err(syntax(format!("unexpected directive in class scope: {first:?}"))),
			}
		}
	}

	/// Parses a `.field` line plus its trailer (annotations, optional
	/// `.end field`).
	fn field<V: ClassVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut V>) -> Result<()> {
		line.next()?;
		let flags = read_access_flags(line);
		let Some(definition) = self.token_or_eol(line)? else {
			return Ok(());
		};
		let (name, descriptor) = definition.split_once(':')
			.ok_or_else(|| syntax(format!("expected '<name>:<descriptor>' - got {definition:?}")))?;
		self.validate_descriptor(descriptor)?;
		let name = name.trim_start_matches('<').trim_end_matches('>');
		let descriptor = Type::parse(descriptor)?;

		// a trailing assignment carries the initial value
		let value = if line.has_next() {
			Some(line.last()?.to_owned())
		} else {
			None
		};

		let mut field: Option<V::Field> = match visitor.as_mut() {
			Some(v) => v.visit_field(flags, name, &descriptor, value.as_deref())?,
			None => None,
		};
		match (field.as_mut(), line.eol_comment()) {
			(Some(f), Some(text)) => f.visit_eol_comment(text)?,
			(None, _) => self.copy_line(line, Scope::Field)?,
			_ => {},
		}

		self.field_trailer(field.as_mut())?;
		if let (Some(field), Some(v)) = (field, visitor.as_mut()) {
			v.finish_field(field)?;
		}
		Ok(())
	}

	/// A field scope stays open for annotations only; anything else ends
	/// it, an explicit `.end field` fires `visit_end`.
	fn field_trailer<F: FieldVisitor>(&mut self, mut visitor: Option<&mut F>) -> Result<()> {
		loop {
			let Some(mut line) = self.next_line() else {
				return Ok(());
			};

			if line.is_empty() {
				match line.eol_comment() {
					Some(text) => if self.options.comments {
						match visitor.as_mut() {
							Some(v) => v.visit_comment(text)?,
							None => self.copy_line(&line, Scope::Field)?,
						}
					},
					None => self.copy_line(&line, Scope::Field)?,
				}
				continue;
			}

			let first = line.peek().unwrap_or_default().to_owned();
			if first == ".annotation" {
				let Some((flags, descriptor)) = self.annotation_declaration(&mut line)? else { continue };
				let mut annotation: Option<F::Annotation> = match visitor.as_mut() {
					Some(v) => v.visit_annotation(flags, &descriptor)?,
					None => None,
				};
				match (annotation.as_mut(), line.eol_comment()) {
					(Some(a), Some(text)) => a.visit_eol_comment(text)?,
					(None, _) => self.copy_line(&line, Scope::Field)?,
					_ => {},
				}
				let ended = self.annotation_body(annotation.as_mut(), "annotation")?;
				if let Some(a) = annotation.as_mut() {
					if ended {
						a.visit_end()?;
					}
				}
				if let (Some(annotation), Some(v)) = (annotation, visitor.as_mut()) {
					v.finish_annotation(annotation)?;
				}
			} else if first == ".end" {
				let mut ahead = line.clone();
				ahead.next()?;
				if ahead.peek() == Some("field") {
					if let Some(v) = visitor.as_mut() {
						v.visit_end()?;
					} else {
						self.copy_line(&line, Scope::Field)?;
					}
					return Ok(());
				}
				// not ours, the field scope is over
				self.push_back(line);
				return Ok(());
			} else {
				self.push_back(line);
				return Ok(());
			}
		}
	}

	/// Parses a `.method` line plus the whole method body.
	fn method<V: ClassVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut V>) -> Result<()> {
		line.next()?;
		let flags = read_access_flags(line);
		let Some(token) = self.token_or_eol(line)? else {
			return Ok(());
		};
		let signature = MethodSignature::parse(&token)
			.map_err(|e| syntax(format!("expected a method signature: {e}")))?;

		let mut method: Option<V::Method> = match visitor.as_mut() {
			Some(v) => v.visit_method(flags, &signature)?,
			None => None,
		};
		match (method.as_mut(), line.eol_comment()) {
			(Some(m), Some(text)) => m.visit_eol_comment(text)?,
			(None, _) => self.copy_line(line, Scope::Method)?,
			_ => {},
		}

		let ended = self.method_body(method.as_mut())?;
		if let Some(m) = method.as_mut() {
			if ended {
				m.visit_end()?;
			}
		}
		if let (Some(method), Some(v)) = (method, visitor.as_mut()) {
			v.finish_method(method)?;
		}
		Ok(())
	}

	/// Parses statements until `.end method`. Returns whether the end
	/// marker was actually seen.
	fn method_body<M: MethodVisitor>(&mut self, mut visitor: Option<&mut M>) -> Result<bool> {
		loop {
			let Some(mut line) = self.next_line() else {
				return Ok(false);
			};

			if line.is_empty() {
				match line.eol_comment() {
					Some(text) => if self.options.comments {
						match visitor.as_mut() {
							Some(v) => v.visit_comment(text)?,
							None => self.copy_line(&line, Scope::Method)?,
						}
					},
					None => self.copy_line(&line, Scope::Method)?,
				}
				continue;
			}

			let first = line.peek().unwrap_or_default().to_owned();

			if let Some(label) = first.strip_prefix(':') {
				match visitor.as_mut() {
					Some(v) => {
						v.visit_block(label)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					},
					None => self.copy_line(&line, Scope::Method)?,
				}
				continue;
			}

			if !first.starts_with('.') {
				self.instruction(&mut line, &mut visitor)?;
				continue;
			}

			let directive = Directive::from_name(&first[1..])
				.ok_or_else(|| syntax(format!("invalid token: {first:?} - not implemented")))?;

			match directive {
				Directive::End => {
					let mut ahead = line.clone();
					ahead.next()?;
					match ahead.peek() {
						Some("method") => {
							if visitor.is_none() {
								self.copy_line(&line, Scope::Method)?;
							}
							return Ok(true);
						},
						// local variable debug markers, no scope change
						Some("local") | Some("param") => self.copy_line(&line, Scope::Method)?,
						other => return Err(syntax(format!("unexpected '.end {}'", other.unwrap_or_default()))),
					}
				},
				Directive::Locals => {
					line.next()?;
					let Some(count) = self.method_int(&mut line)? else { continue };
					if let Some(v) = visitor.as_mut() {
						v.visit_locals(count)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					} else {
						self.copy_line(&line, Scope::Method)?;
					}
				},
				Directive::Registers => {
					line.next()?;
					let Some(count) = self.method_int(&mut line)? else { continue };
					if let Some(v) = visitor.as_mut() {
						v.visit_registers(count)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					} else {
						self.copy_line(&line, Scope::Method)?;
					}
				},
				Directive::Line => {
					line.next()?;
					let Some(number) = self.method_int(&mut line)? else { continue };
					if let Some(v) = visitor.as_mut() {
						v.visit_line(number)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					} else {
						self.copy_line(&line, Scope::Method)?;
					}
				},
				Directive::Prologue => {
					if let Some(v) = visitor.as_mut() {
						v.visit_prologue()?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					} else {
						self.copy_line(&line, Scope::Method)?;
					}
				},
				Directive::Param => {
					let Some(v) = visitor.as_mut() else {
						self.copy_line(&line, Scope::Method)?;
						continue;
					};
					line.next()?;
					let register = line.next()?;
					let register = register.trim_end_matches(',');
					let name = if line.cleaned().contains('"') {
						line.peek().unwrap_or_default().replace('"', "")
					} else {
						String::new()
					};
					v.visit_param(register, &name)?;
					if let Some(text) = line.eol_comment() {
						v.visit_eol_comment(text)?;
					}
				},
				Directive::Local => {
					let Some(v) = visitor.as_mut() else {
						self.copy_line(&line, Scope::Method)?;
						continue;
					};
					line.next()?;
					let values = collect_values(&mut line);
					if values.len() < 2 {
						return Err(syntax(format!("expected values in '.local' statement - got {}", values.len())));
					}
					let register = &values[0];
					let (name, descriptor) = values[1].split_once(':')
						.ok_or_else(|| syntax(format!("expected '<name>:<descriptor>' - got {:?}", values[1])))?;
					let name = name.replace('"', "");
					self.validate_descriptor(descriptor)?;
					let full = values.get(2).map(String::as_str);
					if let Some(full) = full {
						self.validate_descriptor(full)?;
					}
					v.visit_local(register, &name, descriptor, full)?;
					if let Some(text) = line.eol_comment() {
						v.visit_eol_comment(text)?;
					}
				},
				Directive::Restart => {
					let Some(v) = visitor.as_mut() else {
						self.copy_line(&line, Scope::Method)?;
						continue;
					};
					let register = line.last()?;
					v.visit_restart(register)?;
					if let Some(text) = line.eol_comment() {
						v.visit_eol_comment(text)?;
					}
				},
				Directive::Catch => self.catch(&mut line, &mut visitor, false)?,
				Directive::Catchall => self.catch(&mut line, &mut visitor, true)?,
				Directive::PackedSwitch => {
					if !self.packed_switch(&mut line, &mut visitor)? {
						return Ok(false);
					}
				},
				Directive::SparseSwitch => {
					if !self.sparse_switch(&mut line, &mut visitor)? {
						return Ok(false);
					}
				},
				Directive::ArrayData => {
					if !self.array_data(&mut line, &mut visitor)? {
						return Ok(false);
					}
				},
				Directive::Annotation => {
					let Some((flags, descriptor)) = self.annotation_declaration(&mut line)? else { continue };
					let mut annotation: Option<M::Annotation> = match visitor.as_mut() {
						Some(v) => v.visit_annotation(flags, &descriptor)?,
						None => None,
					};
					match (annotation.as_mut(), line.eol_comment()) {
						(Some(a), Some(text)) => a.visit_eol_comment(text)?,
						(None, _) => self.copy_line(&line, Scope::Method)?,
						_ => {},
					}
					let ended = self.annotation_body(annotation.as_mut(), "annotation")?;
					if let Some(a) = annotation.as_mut() {
						if ended {
							a.visit_end()?;
						}
					}
					if let (Some(annotation), Some(v)) = (annotation, visitor.as_mut()) {
						v.finish_annotation(annotation)?;
					}
				},
				_ => return Err(syntax(format!("unexpected directive in method scope: {first:?}"))),
			}
		}
	}

	fn method_int(&self, line: &mut Line) -> Result<Option<usize>> {
		let Some(token) = self.peek_or_eol(line)? else {
			return Ok(None);
		};
		let number = token.parse()
			.map_err(|_| syntax(format!("expected a number - got {token:?}")))?;
		Ok(Some(number))
	}

	fn peek_or_eol(&self, line: &Line) -> Result<Option<String>> {
		match line.peek() {
			Some(token) => Ok(Some(token.to_owned())),
			None => match self.options.errors {
				ErrorMode::Strict => Err(self.unexpected_eol(line)),
				ErrorMode::Ignore => Ok(None),
			},
		}
	}

	fn catch<M: MethodVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut M>, catchall: bool) -> Result<()> {
		let Some(v) = visitor.as_mut() else {
			self.copy_line(line, Scope::Method)?;
			return Ok(());
		};

		line.next()?;
		let exception = if catchall {
			Type::Class("java/lang/Exception".to_owned())
		} else {
			let Some(descriptor) = self.peek_or_eol(line)? else {
				return Ok(());
			};
			self.validate_descriptor(&descriptor)?;
			Type::parse(&descriptor)?
		};

		let cleaned = line.cleaned();
		let (open, close) = match (cleaned.find('{'), cleaned.find('}')) {
			(Some(open), Some(close)) if open < close => (open, close),
			_ => return Err(syntax(format!("expected '{{ :start .. :end }}' - got {:?}", line.raw()))),
		};
		let mut blocks = cleaned[open + 1..close].split_whitespace()
			.filter(|&x| x != "..");
		let (start, end) = match (blocks.next(), blocks.next()) {
			(Some(start), Some(end)) => (start.trim_start_matches(':'), end.trim_start_matches(':')),
			_ => return Err(syntax(format!("expected two block labels - got {:?}", line.raw()))),
		};
		let handler = line.last()?.trim_start_matches(':');

		if catchall {
			v.visit_catchall(start, end, handler)?;
		} else {
			v.visit_catch(&exception, start, end, handler)?;
		}
		if let Some(text) = line.eol_comment() {
			v.visit_eol_comment(text)?;
		}
		Ok(())
	}

	/// Collects a `.packed-switch` table. Returns false when the input
	/// ended inside the table.
	fn packed_switch<M: MethodVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut M>) -> Result<bool> {
		line.next()?;
		let base = line.peek()
			.ok_or_else(|| self.unexpected_eol(line))?
			.to_owned();
		if visitor.is_none() {
			self.copy_line(line, Scope::Method)?;
		}
		if let (Some(v), Some(text)) = (visitor.as_mut(), line.eol_comment()) {
			v.visit_eol_comment(text)?;
		}

		let mut targets = Vec::new();
		loop {
			let Some(entry) = self.next_line() else {
				return Ok(false);
			};
			if visitor.is_none() {
				self.copy_line(&entry, Scope::Method)?;
			}
			if entry.is_empty() {
				continue;
			}
			if let (Some(v), Some(text)) = (visitor.as_mut(), entry.eol_comment()) {
				v.visit_eol_comment(text)?;
			}
			let token = entry.peek().unwrap_or_default();
			if let Some(label) = token.strip_prefix(':') {
				targets.push(label.to_owned());
			} else if entry.cleaned().starts_with(".end") {
				break;
			}
		}

		if let Some(v) = visitor.as_mut() {
			v.visit_packed_switch(&base, &targets)?;
		}
		Ok(true)
	}

	fn sparse_switch<M: MethodVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut M>) -> Result<bool> {
		line.next()?;
		if visitor.is_none() {
			self.copy_line(line, Scope::Method)?;
		}
		if let (Some(v), Some(text)) = (visitor.as_mut(), line.eol_comment()) {
			v.visit_eol_comment(text)?;
		}

		let mut branches = Vec::new();
		loop {
			let Some(entry) = self.next_line() else {
				return Ok(false);
			};
			if visitor.is_none() {
				self.copy_line(&entry, Scope::Method)?;
			}
			if entry.is_empty() {
				continue;
			}
			if let (Some(v), Some(text)) = (visitor.as_mut(), entry.eol_comment()) {
				v.visit_eol_comment(text)?;
			}
			if entry.cleaned().starts_with(".end") {
				break;
			}
			let key = entry.peek().unwrap_or_default().to_owned();
			let label = entry.last()?.trim_start_matches(':').to_owned();
			branches.push((key, label));
		}

		if let Some(v) = visitor.as_mut() {
			v.visit_sparse_switch(&branches)?;
		}
		Ok(true)
	}

	fn array_data<M: MethodVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut M>) -> Result<bool> {
		line.next()?;
		let width = line.peek()
			.ok_or_else(|| self.unexpected_eol(line))?
			.to_owned();
		if visitor.is_none() {
			self.copy_line(line, Scope::Method)?;
		}
		if let (Some(v), Some(text)) = (visitor.as_mut(), line.eol_comment()) {
			v.visit_eol_comment(text)?;
		}

		let mut values = Vec::new();
		loop {
			let Some(entry) = self.next_line() else {
				return Ok(false);
			};
			if visitor.is_none() {
				self.copy_line(&entry, Scope::Method)?;
			}
			if entry.is_empty() {
				continue;
			}
			if let (Some(v), Some(text)) = (visitor.as_mut(), entry.eol_comment()) {
				v.visit_eol_comment(text)?;
			}
			if entry.cleaned().starts_with(".end") {
				break;
			}
			let token = entry.peek().unwrap_or_default();
			values.push(Literal::parse(token)?);
		}

		if let Some(v) = visitor.as_mut() {
			v.visit_array_data(&width, &values)?;
		}
		Ok(true)
	}

	/// Dispatches one instruction line. `invoke*`, `return*` and `goto*`
	/// have dedicated events.
	fn instruction<M: MethodVisitor>(&mut self, line: &mut Line, visitor: &mut Option<&mut M>) -> Result<()> {
		let Some(v) = visitor.as_mut() else {
			self.copy_line(line, Scope::Method)?;
			return Ok(());
		};

		let instruction = line.next()?;
		let kind = match instruction.find('-') {
			Some(index) => instruction[index + 1..].to_owned(),
			None => String::new(),
		};

		if instruction.starts_with(opcode::INVOKE) {
			let cleaned = line.cleaned();
			let (open, close) = match (cleaned.find('{'), cleaned.find('}')) {
				(Some(open), Some(close)) if open < close => (open, close),
				_ => return Err(syntax(format!("expected '{{registers}}' - got {:?}", line.raw()))),
			};
			let registers: Vec<String> = cleaned[open + 1..close].split(',')
				.map(|x| x.trim().to_owned())
				.filter(|x| !x.is_empty())
				.collect();

			let target = line.last()?;
			let (owner, method) = target.split_once("->")
				.ok_or_else(|| syntax(format!("expected 'Lowner;->method' - got {target:?}")))?;
			self.validate_descriptor(owner)?;
			let owner = Type::parse(owner)?;
			let method = method.to_owned();

			v.visit_invoke(&kind, &registers, &owner, &method)?;
		} else if instruction.starts_with(opcode::RETURN) {
			let args = collect_values(line);
			v.visit_return(&kind, &args)?;
		} else if instruction.starts_with(opcode::GOTO) {
			let Some(label) = self.peek_or_eol(line)? else {
				return Ok(());
			};
			v.visit_goto(label.trim_start_matches(':'))?;
		} else {
			let args = collect_values(line);
			v.visit_instruction(&instruction, &args)?;
		}

		if let Some(text) = line.eol_comment() {
			v.visit_eol_comment(text)?;
		}
		Ok(())
	}

	/// Parses the `.annotation`/`.subannotation` declaration tokens.
	fn annotation_declaration(&mut self, line: &mut Line) -> Result<Option<(AccessFlags, Type)>> {
		line.next()?;
		let flags = read_access_flags(line);
		let Some(descriptor) = self.peek_or_eol(line)? else {
			return Ok(None);
		};
		self.validate_descriptor(&descriptor)?;
		Ok(Some((flags, Type::parse(&descriptor)?)))
	}

	/// Parses annotation attribute values until the matching end marker.
	/// Returns whether the marker was seen.
	fn annotation_body<A: AnnotationVisitor>(&mut self, mut visitor: Option<&mut A>, end_token: &str) -> Result<bool> {
		loop {
			let Some(mut line) = self.next_line() else {
				return Ok(false);
			};

			if line.is_empty() {
				match line.eol_comment() {
					Some(text) => if self.options.comments {
						match visitor.as_mut() {
							Some(v) => v.visit_comment(text)?,
							None => self.copy_line(&line, Scope::Annotation)?,
						}
					},
					None => self.copy_line(&line, Scope::Annotation)?,
				}
				continue;
			}

			let first = line.peek().unwrap_or_default().to_owned();
			if first == ".end" {
				let mut ahead = line.clone();
				ahead.next()?;
				match ahead.peek() {
					Some(token) if token == end_token => {
						if visitor.is_none() {
							self.copy_line(&line, Scope::Annotation)?;
						}
						return Ok(true);
					},
					other => return Err(syntax(format!("expected '.end {end_token}' - got '.end {}'", other.unwrap_or_default()))),
				}
			}
			if first.starts_with('.') {
				return Err(syntax(format!("unexpected directive in annotation scope: {first:?}")));
			}

			// name = <value> | { … } | .subannotation | .enum
			let name = line.next()?;
			let equals = line.next()?;
			if self.options.validate && equals != "=" {
				return Err(syntax(format!("expected '=' - got {equals:?}")));
			}

			let statement = line.peek()
				.ok_or_else(|| self.unexpected_eol(&line))?
				.to_owned();

			if statement == ".subannotation" {
				let Some((flags, descriptor)) = self.annotation_declaration(&mut line)? else { continue };
				let mut sub: Option<A::Sub> = match visitor.as_mut() {
					Some(v) => v.visit_subannotation(&name, flags, &descriptor)?,
					None => None,
				};
				match (sub.as_mut(), line.eol_comment()) {
					(Some(s), Some(text)) => s.visit_eol_comment(text)?,
					(None, _) => self.copy_line(&line, Scope::Annotation)?,
					_ => {},
				}
				let ended = self.annotation_body(sub.as_mut(), "subannotation")?;
				if let Some(s) = sub.as_mut() {
					if ended {
						s.visit_end()?;
					}
				}
				if let (Some(sub), Some(v)) = (sub, visitor.as_mut()) {
					v.finish_subannotation(&name, sub)?;
				}
			} else if statement == ".enum" {
				line.next()?;
				let target = line.peek().ok_or_else(|| self.unexpected_eol(&line))?;
				let (owner, value) = target.split_once("->")
					.ok_or_else(|| syntax(format!("expected 'Lowner;->name:type' - got {target:?}")))?;
				self.validate_descriptor(owner)?;
				let (const_name, const_type) = value.split_once(':')
					.ok_or_else(|| syntax(format!("expected 'name:type' - got {value:?}")))?;
				self.validate_descriptor(const_type)?;
				let const_name = const_name.trim_start_matches('<').trim_end_matches('>');

				match visitor.as_mut() {
					Some(v) => {
						v.visit_enum(&name, &Type::parse(owner)?, const_name, &Type::parse(const_type)?)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					},
					None => self.copy_line(&line, Scope::Annotation)?,
				}
			} else if statement.starts_with('{') {
				if visitor.is_none() {
					self.copy_line(&line, Scope::Annotation)?;
				}
				let cleaned = line.cleaned().to_owned();
				let values = if let (Some(open), Some(close)) = (cleaned.find('{'), cleaned.find('}')) {
					cleaned[open + 1..close].split(',')
						.map(|x| x.trim().to_owned())
						.filter(|x| !x.is_empty())
						.collect()
				} else {
					if let (Some(v), Some(text)) = (visitor.as_mut(), line.eol_comment()) {
						v.visit_eol_comment(text)?;
					}
					let mut values = Vec::new();
					loop {
						let Some(entry) = self.next_line() else {
							break;
						};
						if visitor.is_none() {
							self.copy_line(&entry, Scope::Annotation)?;
						}
						if entry.is_empty() {
							continue;
						}
						if let (Some(v), Some(text)) = (visitor.as_mut(), entry.eol_comment()) {
							v.visit_eol_comment(text)?;
						}
						let entry_cleaned = entry.cleaned();
						if entry_cleaned == "}" || entry_cleaned.ends_with('}') {
							break;
						}
						values.push(entry.peek().unwrap_or_default().trim_end_matches(',').to_owned());
					}
					values
				};
				if let Some(v) = visitor.as_mut() {
					v.visit_array(&name, &values)?;
				}
			} else {
				match visitor.as_mut() {
					Some(v) => {
						v.visit_value(&name, &statement)?;
						if let Some(text) = line.eol_comment() {
							v.visit_eol_comment(text)?;
						}
					},
					None => self.copy_line(&line, Scope::Annotation)?,
				}
			}
		}
	}
}

fn read_access_flags(line: &mut Line) -> AccessFlags {
	let mut flags = AccessFlags::NONE;
	while let Some(token) = line.peek().map(str::to_owned) {
		if !AccessFlags::is_known(&token) {
			break;
		}
		flags |= AccessFlags::from_names([token.as_str()]);
		let _ = line.next();
	}
	flags
}

/// Collects the rest of the line, splitting unquoted values on `,`.
fn collect_values(line: &mut Line) -> Vec<String> {
	let mut values = Vec::new();
	while let Ok(value) = line.next() {
		let value = value.trim_end_matches(',');
		if !value.starts_with(['"', '\'']) && !value.ends_with(['"', '\'']) && value.contains(',') {
			values.extend(value.split(',').filter(|x| !x.is_empty()).map(str::to_owned));
		} else {
			values.push(value.to_owned());
		}
	}
	values
}
