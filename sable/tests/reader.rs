use std::cell::RefCell;
use std::rc::Rc;
use pretty_assertions::assert_eq;
use anyhow::Result;
use sable::flags::AccessFlags;
use sable::reader::{ErrorMode, Scope, SmaliReader};
use sable::types::{Literal, MethodSignature, Type};
use sable::visitor::annotation::AnnotationVisitor;
use sable::visitor::class::ClassVisitor;
use sable::visitor::field::FieldVisitor;
use sable::visitor::method::MethodVisitor;
use sable::writer::SmaliWriter;

/// Records every event as a line of text; one instance serves all four
/// scopes through a shared buffer.
#[derive(Debug, Clone, Default)]
struct Recorder {
	events: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
	fn push(&self, event: String) {
		self.events.borrow_mut().push(event);
	}

	fn events(&self) -> Vec<String> {
		self.events.borrow().clone()
	}
}

impl ClassVisitor for Recorder {
	type Annotation = Recorder;
	type Field = Recorder;
	type Method = Recorder;
	type Inner = Recorder;

	fn visit_class(&mut self, name: &Type, access: AccessFlags) -> Result<()> {
		self.push(format!("class {access} {name}"));
		Ok(())
	}

	fn visit_super(&mut self, super_class: &Type) -> Result<()> {
		self.push(format!("super {super_class}"));
		Ok(())
	}

	fn visit_implements(&mut self, interface: &Type) -> Result<()> {
		self.push(format!("implements {interface}"));
		Ok(())
	}

	fn visit_source(&mut self, source: &str) -> Result<()> {
		self.push(format!("source {source}"));
		Ok(())
	}

	fn visit_debug(&mut self, enabled: bool) -> Result<()> {
		self.push(format!("debug {enabled}"));
		Ok(())
	}

	fn visit_field(&mut self, access: AccessFlags, name: &str, descriptor: &Type, value: Option<&str>) -> Result<Option<Recorder>> {
		self.push(format!("field {access} {name}:{descriptor} = {value:?}"));
		Ok(Some(self.clone()))
	}

	fn visit_method(&mut self, access: AccessFlags, signature: &MethodSignature) -> Result<Option<Recorder>> {
		self.push(format!("method {access} {}", signature.name_and_descriptor()));
		Ok(Some(self.clone()))
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<Recorder>> {
		self.push(format!("annotation {access} {descriptor}"));
		Ok(Some(self.clone()))
	}

	fn visit_inner_class(&mut self, name: &Type, access: AccessFlags) -> Result<Option<Recorder>> {
		self.push(format!("inner-class {access} {name}"));
		Ok(Some(self.clone()))
	}

	fn visit_comment(&mut self, text: &str) -> Result<()> {
		self.push(format!("comment {text}"));
		Ok(())
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.push(format!("eol {text}"));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.push("end".to_owned());
		Ok(())
	}
}

impl FieldVisitor for Recorder {
	type Annotation = Recorder;

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<Recorder>> {
		self.push(format!("annotation {access} {descriptor}"));
		Ok(Some(self.clone()))
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.push(format!("eol {text}"));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.push("end-field".to_owned());
		Ok(())
	}
}

impl MethodVisitor for Recorder {
	type Annotation = Recorder;

	fn visit_param(&mut self, register: &str, name: &str) -> Result<()> {
		self.push(format!("param {register} {name:?}"));
		Ok(())
	}

	fn visit_locals(&mut self, count: usize) -> Result<()> {
		self.push(format!("locals {count}"));
		Ok(())
	}

	fn visit_registers(&mut self, count: usize) -> Result<()> {
		self.push(format!("registers {count}"));
		Ok(())
	}

	fn visit_line(&mut self, number: usize) -> Result<()> {
		self.push(format!("line {number}"));
		Ok(())
	}

	fn visit_prologue(&mut self) -> Result<()> {
		self.push("prologue".to_owned());
		Ok(())
	}

	fn visit_block(&mut self, label: &str) -> Result<()> {
		self.push(format!("label {label}"));
		Ok(())
	}

	fn visit_goto(&mut self, label: &str) -> Result<()> {
		self.push(format!("goto {label}"));
		Ok(())
	}

	fn visit_invoke(&mut self, kind: &str, registers: &[String], owner: &Type, method: &str) -> Result<()> {
		self.push(format!("invoke {kind} {registers:?} {owner} {method}"));
		Ok(())
	}

	fn visit_return(&mut self, kind: &str, args: &[String]) -> Result<()> {
		self.push(format!("return {kind:?} {args:?}"));
		Ok(())
	}

	fn visit_instruction(&mut self, name: &str, args: &[String]) -> Result<()> {
		self.push(format!("ins {name} {args:?}"));
		Ok(())
	}

	fn visit_catch(&mut self, exception: &Type, start: &str, end: &str, handler: &str) -> Result<()> {
		self.push(format!("catch {exception} {start}..{end} -> {handler}"));
		Ok(())
	}

	fn visit_catchall(&mut self, start: &str, end: &str, handler: &str) -> Result<()> {
		self.push(format!("catchall {start}..{end} -> {handler}"));
		Ok(())
	}

	fn visit_packed_switch(&mut self, base: &str, targets: &[String]) -> Result<()> {
		self.push(format!("packed-switch {base} {targets:?}"));
		Ok(())
	}

	fn visit_sparse_switch(&mut self, branches: &[(String, String)]) -> Result<()> {
		self.push(format!("sparse-switch {branches:?}"));
		Ok(())
	}

	fn visit_array_data(&mut self, width: &str, values: &[Literal]) -> Result<()> {
		self.push(format!("array-data {width} {values:?}"));
		Ok(())
	}

	fn visit_local(&mut self, register: &str, name: &str, descriptor: &str, full_descriptor: Option<&str>) -> Result<()> {
		self.push(format!("local {register} {name:?}:{descriptor} {full_descriptor:?}"));
		Ok(())
	}

	fn visit_restart(&mut self, register: &str) -> Result<()> {
		self.push(format!("restart {register}"));
		Ok(())
	}

	fn visit_annotation(&mut self, access: AccessFlags, descriptor: &Type) -> Result<Option<Recorder>> {
		self.push(format!("annotation {access} {descriptor}"));
		Ok(Some(self.clone()))
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.push(format!("eol {text}"));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.push("end-method".to_owned());
		Ok(())
	}
}

impl AnnotationVisitor for Recorder {
	type Sub = Recorder;

	fn visit_value(&mut self, name: &str, value: &str) -> Result<()> {
		self.push(format!("value {name} = {value}"));
		Ok(())
	}

	fn visit_array(&mut self, name: &str, values: &[String]) -> Result<()> {
		self.push(format!("value-array {name} = {values:?}"));
		Ok(())
	}

	fn visit_enum(&mut self, name: &str, owner: &Type, const_name: &str, const_type: &Type) -> Result<()> {
		self.push(format!("enum {name} = {owner}->{const_name}:{const_type}"));
		Ok(())
	}

	fn visit_subannotation(&mut self, name: &str, access: AccessFlags, descriptor: &Type) -> Result<Option<Recorder>> {
		self.push(format!("subannotation {name} {access} {descriptor}"));
		Ok(Some(self.clone()))
	}

	fn visit_eol_comment(&mut self, text: &str) -> Result<()> {
		self.push(format!("eol {text}"));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.push("end-annotation".to_owned());
		Ok(())
	}
}

fn record(reader: &SmaliReader, source: &str) -> Result<Vec<String>> {
	let mut recorder = Recorder::default();
	reader.visit(source, &mut recorder)?;
	Ok(recorder.events())
}

#[test]
fn class_declarations() -> Result<()> {
	let source = "\
.class public final Lcom/example/A;
.super Ljava/lang/Object;
.source \"A.java\"
.implements Ljava/io/Serializable;
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public final Lcom/example/A;",
		"super Ljava/lang/Object;",
		"source A.java",
		"implements Ljava/io/Serializable;",
		"end",
	]);
	Ok(())
}

#[test]
fn fields_and_methods() -> Result<()> {
	let source = "\
.class public Lcom/example/B;
.super Ljava/lang/Object;

.field public static COUNT:I = 0x0

.method public static add(II)I
    .locals 1
    add-int v0, p0, p1
    return v0
.end method
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public Lcom/example/B;",
		"super Ljava/lang/Object;",
		"field public static COUNT:I = Some(\"0x0\")",
		"method public static add(II)I",
		"locals 1",
		"ins add-int [\"v0\", \"p0\", \"p1\"]",
		"return \"\" [\"v0\"]",
		"end-method",
		"end",
	]);
	Ok(())
}

#[test]
fn invoke_and_goto() -> Result<()> {
	let source = "\
.class public Lcom/example/C;
.super Ljava/lang/Object;

.method public run()V
    .locals 1
    :start
    invoke-virtual {p0, v0}, Lcom/example/C;->step(I)V
    goto :start
.end method
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public Lcom/example/C;",
		"super Ljava/lang/Object;",
		"method public run()V",
		"locals 1",
		"label start",
		"invoke virtual [\"p0\", \"v0\"] Lcom/example/C; step(I)V",
		"goto start",
		"end-method",
		"end",
	]);
	Ok(())
}

#[test]
fn switch_tables_and_array_data() -> Result<()> {
	let source = "\
.class public Lcom/example/D;
.super Ljava/lang/Object;

.method public static pick(I)I
    .locals 1
    packed-switch p0, :table
    sparse-switch p0, :sparse
    fill-array-data p0, :data
    return p0
    :table
    .packed-switch 0x0
        :a
        :b
    .end packed-switch
    :sparse
    .sparse-switch
        0x10 -> :a
        0x20 -> :b
    .end sparse-switch
    :data
    .array-data 4
        0x1
        0x2
    .end array-data
.end method
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public Lcom/example/D;",
		"super Ljava/lang/Object;",
		"method public static pick(I)I",
		"locals 1",
		"ins packed-switch [\"p0\", \":table\"]",
		"ins sparse-switch [\"p0\", \":sparse\"]",
		"ins fill-array-data [\"p0\", \":data\"]",
		"return \"\" [\"p0\"]",
		"label table",
		"packed-switch 0x0 [\"a\", \"b\"]",
		"label sparse",
		"sparse-switch [(\"0x10\", \"a\"), (\"0x20\", \"b\")]",
		"label data",
		"array-data 4 [Int(1), Int(2)]",
		"end-method",
		"end",
	]);
	Ok(())
}

#[test]
fn annotations() -> Result<()> {
	let source = "\
.class public Lcom/example/E;
.super Ljava/lang/Object;

.annotation system Ldalvik/annotation/MemberClasses;
    value = {
        Lcom/example/E$A;,
        Lcom/example/E$B;
    }
    name = \"outer\"
    kind = .enum Ldalvik/Kind;->MEMBER:Ldalvik/Kind;
    inner = .subannotation Ldalvik/annotation/Inner;
        depth = 0x2
    .end subannotation
.end annotation
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public Lcom/example/E;",
		"super Ljava/lang/Object;",
		"annotation system Ldalvik/annotation/MemberClasses;",
		"value-array value = [\"Lcom/example/E$A;\", \"Lcom/example/E$B;\"]",
		"value name = \"outer\"",
		"enum kind = Ldalvik/Kind;->MEMBER:Ldalvik/Kind;",
		"subannotation inner  Ldalvik/annotation/Inner;",
		"value depth = 0x2",
		"end-annotation",
		"end-annotation",
		"end",
	]);
	Ok(())
}

#[test]
fn field_annotation_trailer() -> Result<()> {
	let source = "\
.class public Lcom/example/F;
.super Ljava/lang/Object;

.field private name:Ljava/lang/String;
    .annotation runtime Lcom/example/Tag;
    .end annotation
.end field

.field private other:I
";
	let events = record(&SmaliReader::new(), source)?;
	assert_eq!(events, vec![
		"class public Lcom/example/F;",
		"super Ljava/lang/Object;",
		"field private name:Ljava/lang/String; = None",
		"annotation runtime Lcom/example/Tag;",
		"end-annotation",
		"end-field",
		"field private other:I = None",
		"end",
	]);
	Ok(())
}

#[test]
fn catch_directives() -> Result<()> {
	let source = "\
.class public Lcom/example/G;
.super Ljava/lang/Object;

.method public static risky()V
    .locals 1
    :try_start_0
    nop
    :try_end_0
    .catch Ljava/io/IOException; {:try_start_0 .. :try_end_0} :handler
    .catchall {:try_start_0 .. :try_end_0} :cleanup
    return-void
    :handler
    return-void
    :cleanup
    return-void
.end method
";
	let events = record(&SmaliReader::new(), source)?;
	assert!(events.contains(&"catch Ljava/io/IOException; try_start_0..try_end_0 -> handler".to_owned()));
	assert!(events.contains(&"catchall try_start_0..try_end_0 -> cleanup".to_owned()));
	Ok(())
}

#[test]
fn comments_are_opt_in() -> Result<()> {
	let source = "\
.class public Lcom/example/H; # trailing
.super Ljava/lang/Object;
# a lone comment
";
	let without = record(&SmaliReader::new(), source)?;
	assert_eq!(without, vec![
		"class public Lcom/example/H;",
		"eol trailing",
		"super Ljava/lang/Object;",
		"end",
	]);

	let with = record(&SmaliReader::new().comments(true), source)?;
	assert_eq!(with, vec![
		"class public Lcom/example/H;",
		"eol trailing",
		"super Ljava/lang/Object;",
		"comment a lone comment",
		"end",
	]);
	Ok(())
}

#[test]
fn snippet_mode_skips_the_class_definition() -> Result<()> {
	let source = "\
.method public static f()V
    return-void
.end method
";
	let events = record(&SmaliReader::new().snippet(true), source)?;
	assert_eq!(events, vec![
		"method public static f()V",
		"return \"void\" []",
		"end-method",
		"end",
	]);
	Ok(())
}

#[test]
fn unknown_directives_fail() {
	let source = "\
.class public Lcom/example/I;
.frobnicate all the things
";
	let result = record(&SmaliReader::new(), source);
	assert!(result.is_err());
	assert!(result.unwrap_err().to_string().contains("not implemented"));
}

#[test]
fn error_mode_controls_truncated_directives() {
	let source = "\
.class public Lcom/example/J;
.field public
";
	assert!(record(&SmaliReader::new(), source).is_err());
	assert!(record(&SmaliReader::new().errors(ErrorMode::Ignore), source).is_ok());
}

#[test]
fn validation_rejects_bad_descriptors() {
	let source = "\
.class public Lcom/example/K;
.implements NotADescriptor
";
	assert!(record(&SmaliReader::new(), source).is_err());
	assert!(record(&SmaliReader::new().validate(false), source).is_ok());
}

/// A visitor declining every method scope.
#[derive(Default)]
struct HeadersOnly {
	methods: Vec<String>,
}

impl ClassVisitor for HeadersOnly {
	type Annotation = ();
	type Field = ();
	type Method = ();
	type Inner = ();

	fn visit_method(&mut self, _access: AccessFlags, signature: &MethodSignature) -> Result<Option<()>> {
		self.methods.push(signature.name_and_descriptor());
		Ok(None)
	}
}

#[test]
fn declined_scopes_go_to_the_copy_handler() -> Result<()> {
	let source = "\
.class public Lcom/example/L;
.super Ljava/lang/Object;

.method public static f()V
    return-void
.end method
";
	let mut copied: Vec<(String, Scope)> = Vec::new();
	let mut handler = |line: &str, scope: Scope| -> Result<()> {
		copied.push((line.to_owned(), scope));
		Ok(())
	};

	let mut visitor = HeadersOnly::default();
	SmaliReader::new().visit_with_copy(source, &mut visitor, &mut handler)?;

	assert_eq!(visitor.methods, vec!["f()V"]);
	let lines: Vec<&str> = copied.iter().map(|(line, _)| line.as_str()).collect();
	assert!(lines.contains(&"    return-void"));
	assert!(copied.iter().any(|(_, scope)| *scope == Scope::Method));
	Ok(())
}

#[test]
fn event_stream_survives_rewriting() -> Result<()> {
	let source = "\
.class public Lcom/example/M;
.super Ljava/lang/Object;
.implements Ljava/lang/Runnable;

.field public static COUNT:I = 0x0

.field private name:Ljava/lang/String;

.method public constructor <init>()V
    .locals 0
    invoke-direct {p0}, Ljava/lang/Object;-><init>()V
    return-void
.end method

.method public static next()I
    .locals 1
    sget v0, Lcom/example/M;->COUNT:I
    add-int/lit8 v0, v0, 0x1
    sput v0, Lcom/example/M;->COUNT:I
    return v0
.end method
";
	let reader = SmaliReader::new();

	let mut writer = SmaliWriter::new();
	reader.visit(source, &mut writer)?;
	let rewritten = writer.code();

	let original_events = record(&reader, source)?;
	let rewritten_events = record(&reader, &rewritten)?;
	assert_eq!(original_events, rewritten_events);
	Ok(())
}
