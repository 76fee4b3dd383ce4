use pretty_assertions::assert_eq;
use anyhow::Result;
use sable::types::{is_type_descriptor, Literal, MethodSignature, Type};

#[test]
fn canonical_round_trip() -> Result<()> {
	for descriptor in [
		"Z", "B", "S", "C", "I", "J", "F", "D", "V",
		"Ljava/lang/Object;",
		"Lcom/example/deep/pkg/Name;",
		"[I",
		"[[B",
		"[[[Lcom/a/B;",
	] {
		assert_eq!(Type::parse(descriptor)?.descriptor(), descriptor);
	}
	Ok(())
}

#[test]
fn normalization() -> Result<()> {
	assert_eq!(Type::parse("com.example.Class")?.descriptor(), "Lcom/example/Class;");
	assert_eq!(Type::parse("com/example/Class")?.descriptor(), "Lcom/example/Class;");
	assert_eq!(
		Type::parse("com.example.Class")?,
		Type::parse("Lcom/example/Class;")?,
	);
	Ok(())
}

#[test]
fn array_names() -> Result<()> {
	let array = Type::parse("[[Lcom/a/B;")?;
	assert_eq!(array.dim(), 2);
	assert_eq!(array.pretty_name(), "com.a.B[][]");
	assert_eq!(array.simple_name(), "B[][]");
	assert_eq!(array.array_type(), Some(Type::parse("Lcom/a/B;")?));
	Ok(())
}

#[test]
fn signature_decomposition() -> Result<()> {
	let init = MethodSignature::parse("<init>(II)V")?;
	assert_eq!(init.name(), "<init>");
	assert_eq!(init.parameters().len(), 2);
	assert_eq!(init.parameters()[0].descriptor(), "I");
	assert_eq!(init.return_type().descriptor(), "V");

	let qualified = MethodSignature::parse("Lcom/a/B;->foo(Ljava/lang/String;)I")?;
	let owner = qualified.owner().expect("qualified signature has an owner");
	assert_eq!(owner.pretty_name(), "com.a.B");
	assert_eq!(qualified.name(), "foo");
	assert_eq!(qualified.return_type().descriptor(), "I");
	assert_eq!(qualified.sig(), "Lcom/a/B;->foo(Ljava/lang/String;)I");
	Ok(())
}

#[test]
fn signature_through_type() -> Result<()> {
	let ty = Type::parse("run([Ljava/lang/String;)V")?;
	assert!(ty.is_signature());
	let signature = ty.signature().expect("is a signature");
	assert_eq!(signature.name(), "run");
	assert_eq!(signature.parameters()[0].descriptor(), "[Ljava/lang/String;");
	Ok(())
}

#[test]
fn literal_decoding() -> Result<()> {
	assert_eq!(Literal::parse("0x10")?, Literal::Int(16));
	assert_eq!(Literal::parse("10s")?, Literal::Int(10));
	assert_eq!(Literal::parse("0xal")?, Literal::Int(10));
	assert_eq!(Literal::parse("3t")?, Literal::Int(3));
	assert_eq!(Literal::parse("1.5f")?, Literal::Float(1.5));
	assert_eq!(Literal::parse("2.5")?, Literal::Float(2.5));
	assert_eq!(Literal::parse("\"ab\"")?, Literal::String("ab".to_owned()));
	assert_eq!(Literal::parse("true")?, Literal::Bool(true));
	assert_eq!(Literal::parse("false")?, Literal::Bool(false));
	assert_eq!(Literal::parse("'z'")?, Literal::Char('z'));
	Ok(())
}

#[test]
fn literal_rendering_survives_reparse() -> Result<()> {
	for raw in ["0x10", "-0x1", "10s", "1.5f", "2.0", "true", "'x'", "\"a b\"", "[I"] {
		let literal = Literal::parse(raw)?;
		assert_eq!(Literal::parse(&literal.to_string())?, literal);
	}
	Ok(())
}

#[test]
fn descriptor_predicate() {
	assert!(is_type_descriptor("I"));
	assert!(is_type_descriptor("[[J"));
	assert!(is_type_descriptor("Ljava/lang/String;"));
	assert!(!is_type_descriptor("java/lang/String"));
	assert!(!is_type_descriptor("L;"));
	assert!(!is_type_descriptor("hello"));
}
