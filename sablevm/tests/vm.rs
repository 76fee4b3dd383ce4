use std::cell::RefCell;
use std::rc::Rc;
use pretty_assertions::assert_eq;
use anyhow::Result;
use sablevm::errors::VmError;
use sablevm::executor::OpcodeTable;
use sablevm::lang::{Member, SmaliObject};
use sablevm::value::Value;
use sablevm::vm::SmaliVm;

#[test]
fn constant_arithmetic() -> Result<()> {
	let source = "\
.class public LCalc;
.super Ljava/lang/Object;

.method public static add()I
    const/4 v0, 0x1
    const/4 v1, 0x2
    add-int v2, v0, v1
    return v2
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("add()I")?;
	assert_eq!(vm.call(&method, None, &[])?, Value::Int(3));
	Ok(())
}

#[test]
fn static_field_increments_survive_calls() -> Result<()> {
	let source = "\
.class public LCounter;
.super Ljava/lang/Object;

.field public static COUNT:I = 0x0

.method public static increment()V
    .locals 1
    sget v0, LCounter;->COUNT:I
    add-int/lit8 v0, v0, 0x1
    sput v0, LCounter;->COUNT:I
    return-void
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("increment()V")?;

	vm.call(&method, None, &[])?;
	vm.call(&method, None, &[])?;
	assert_eq!(class.field("COUNT")?.value(), Value::Int(2));
	Ok(())
}

#[test]
fn packed_switch_transfers_control() -> Result<()> {
	let source = "\
.class public LSwitch;
.super Ljava/lang/Object;

.method public static pick(I)I
    .locals 1
    packed-switch p0, :data
    const/4 v0, -0x1
    return v0
    :a
    const/4 v0, 0xa
    return v0
    :b
    const/4 v0, 0xb
    return v0
    :c
    const/4 v0, 0xc
    return v0
    :data
    .packed-switch 0x0
        :a
        :b
        :c
    .end packed-switch
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("pick(I)I")?;

	assert_eq!(vm.call(&method, None, &[Value::Int(0)])?, Value::Int(0xa));
	assert_eq!(vm.call(&method, None, &[Value::Int(1)])?, Value::Int(0xb));
	assert_eq!(vm.call(&method, None, &[Value::Int(2)])?, Value::Int(0xc));
	// out of range falls through to the default path
	assert_eq!(vm.call(&method, None, &[Value::Int(7)])?, Value::Int(-1));
	Ok(())
}

#[test]
fn sparse_switch_matches_exact_cases() -> Result<()> {
	let source = "\
.class public LSparse;
.super Ljava/lang/Object;

.method public static pick(I)I
    .locals 1
    sparse-switch p0, :data
    const/4 v0, 0x0
    return v0
    :ten
    const/4 v0, 0x1
    return v0
    :forty
    const/4 v0, 0x2
    return v0
    :data
    .sparse-switch
        0xa -> :ten
        0x28 -> :forty
    .end sparse-switch
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("pick(I)I")?;

	assert_eq!(vm.call(&method, None, &[Value::Int(10)])?, Value::Int(1));
	assert_eq!(vm.call(&method, None, &[Value::Int(40)])?, Value::Int(2));
	assert_eq!(vm.call(&method, None, &[Value::Int(11)])?, Value::Int(0));
	Ok(())
}

#[test]
fn new_instance_runs_the_constructor() -> Result<()> {
	let source = "\
.class public Lcom/Ex;
.super Ljava/lang/Object;

.field public ready:I

.method public constructor <init>()V
    .locals 1
    const/4 v0, 0x1
    iput v0, p0, Lcom/Ex;->ready:I
    return-void
.end method

.method public static create()Lcom/Ex;
    .locals 1
    new-instance v0, Lcom/Ex;
    invoke-direct {v0}, Lcom/Ex;-><init>()V
    return-object v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("create()Lcom/Ex;")?;

	let result = vm.call(&method, None, &[])?;
	let Value::Object(object) = result else {
		panic!("expected an object, got {result:?}");
	};
	assert_eq!(object.class().descriptor(), "Lcom/Ex;");
	assert_eq!(object.class().name(), "com.Ex");
	assert_eq!(object.get("ready")?, Value::Int(1));
	Ok(())
}

#[test]
fn array_access_is_bounds_checked() -> Result<()> {
	let source = "\
.class public LArrays;
.super Ljava/lang/Object;

.method public static pick([II)I
    .locals 1
    aget v0, p0, p1
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("pick([II)I")?;

	let array = Value::Array(Rc::new(RefCell::new(vec![
		Value::Int(10), Value::Int(20), Value::Int(30),
	])));

	assert_eq!(vm.call(&method, None, &[array.clone(), Value::Int(1)])?, Value::Int(20));

	let error = vm.call(&method, None, &[array, Value::Int(3)]).unwrap_err();
	assert_eq!(error.execution_name(), Some("IndexOutOfBoundsError"));
	Ok(())
}

#[test]
fn clinit_runs_at_load_time() -> Result<()> {
	let source = "\
.class public LConfig;
.super Ljava/lang/Object;

.field public static NAME:Ljava/lang/String;

.method static constructor <clinit>()V
    .locals 1
    const-string v0, \"hello\"
    sput-object v0, LConfig;->NAME:Ljava/lang/String;
    return-void
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	assert_eq!(class.field("NAME")?.value(), Value::String("hello".to_owned()));
	Ok(())
}

#[test]
fn clinit_runs_once() -> Result<()> {
	let source = "\
.class public LOnce;
.super Ljava/lang/Object;

.field public static COUNT:I = 0x0

.method static constructor <clinit>()V
    .locals 1
    sget v0, LOnce;->COUNT:I
    add-int/lit8 v0, v0, 0x1
    sput v0, LOnce;->COUNT:I
    return-void
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	class.clinit(&vm)?;
	class.clinit(&vm)?;
	assert_eq!(class.field("COUNT")?.value(), Value::Int(1));
	Ok(())
}

#[test]
fn overload_resolution_uses_the_return_hint() -> Result<()> {
	let source = "\
.class public LOverloads;
.super Ljava/lang/Object;

.method public static foo(I)V
    .locals 0
    return-void
.end method

.method public static foo(I)I
    .locals 1
    const/4 v0, 0x7
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let broker = class.broker("foo")?;

	let value_variant = broker.resolve(1, Some(true))?;
	assert_eq!(value_variant.return_type().descriptor(), "I");
	assert_eq!(vm.call(&value_variant, None, &[Value::Int(0)])?, Value::Int(7));

	let void_variant = broker.resolve(1, Some(false))?;
	assert_eq!(void_variant.return_type().descriptor(), "V");

	let ambiguous = broker.resolve(1, None).unwrap_err();
	assert!(matches!(ambiguous, VmError::NoSuchMethod(_)));
	Ok(())
}

#[test]
fn recursion_gets_a_fresh_frame_per_call() -> Result<()> {
	let source = "\
.class public LMath;
.super Ljava/lang/Object;

.method public static fact(I)I
    .locals 2
    const/4 v0, 0x1
    if-gt p0, v0, :recurse
    return v0
    :recurse
    const/4 v1, 0x1
    sub-int v1, p0, v1
    invoke-static {v1}, LMath;->fact(I)I
    move-result v1
    mul-int v0, p0, v1
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("fact(I)I")?;
	assert_eq!(vm.call(&method, None, &[Value::Int(5)])?, Value::Int(120));
	Ok(())
}

#[test]
fn loops_with_goto_and_branches() -> Result<()> {
	let source = "\
.class public LLoop;
.super Ljava/lang/Object;

.method public static sum(I)I
    .locals 2
    const/4 v0, 0x0
    const/4 v1, 0x1
    :loop
    if-gt v1, p0, :done
    add-int v0, v0, v1
    add-int/lit8 v1, v1, 0x1
    goto :loop
    :done
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("sum(I)I")?;
	assert_eq!(vm.call(&method, None, &[Value::Int(5)])?, Value::Int(15));
	Ok(())
}

#[test]
fn instance_fields_live_on_the_object() -> Result<()> {
	let source = "\
.class public LPoint;
.super Ljava/lang/Object;

.field private x:I

.method public constructor <init>()V
    .locals 0
    return-void
.end method

.method public static demo()I
    .locals 2
    new-instance v0, LPoint;
    const/16 v1, 0x15
    iput v1, v0, LPoint;->x:I
    iget v1, v0, LPoint;->x:I
    return v1
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("demo()I")?;
	assert_eq!(vm.call(&method, None, &[])?, Value::Int(21));
	Ok(())
}

#[test]
fn division_floors_and_remainder_follows_the_divisor() -> Result<()> {
	let source = "\
.class public LDiv;
.super Ljava/lang/Object;

.method public static floordiv(II)I
    .locals 1
    div-int v0, p0, p1
    return v0
.end method

.method public static remainder(II)I
    .locals 1
    rem-int v0, p0, p1
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;

	let floordiv = class.method("floordiv(II)I")?;
	assert_eq!(vm.call(&floordiv, None, &[Value::Int(-7), Value::Int(2)])?, Value::Int(-4));
	assert_eq!(vm.call(&floordiv, None, &[Value::Int(7), Value::Int(2)])?, Value::Int(3));

	let remainder = class.method("remainder(II)I")?;
	assert_eq!(vm.call(&remainder, None, &[Value::Int(-7), Value::Int(3)])?, Value::Int(2));
	assert_eq!(vm.call(&remainder, None, &[Value::Int(7), Value::Int(-3)])?, Value::Int(-2));

	let error = vm.call(&floordiv, None, &[Value::Int(1), Value::Int(0)]).unwrap_err();
	assert_eq!(error.execution_name(), Some("ArithmeticError"));
	Ok(())
}

#[test]
fn conversions_mask_and_extend() -> Result<()> {
	let source = "\
.class public LConv;
.super Ljava/lang/Object;

.method public static toByte(I)I
    .locals 1
    int-to-byte v0, p0
    return v0
.end method

.method public static toChar(I)I
    .locals 1
    int-to-char v0, p0
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;

	let to_byte = class.method("toByte(I)I")?;
	assert_eq!(vm.call(&to_byte, None, &[Value::Int(0x100)])?, Value::Int(0));
	assert_eq!(vm.call(&to_byte, None, &[Value::Int(0xFF)])?, Value::Int(-1));
	assert_eq!(vm.call(&to_byte, None, &[Value::Int(0x7F)])?, Value::Int(127));

	let to_char = class.method("toChar(I)I")?;
	assert_eq!(vm.call(&to_char, None, &[Value::Int(0x1_0041)])?, Value::Int(0x41));
	Ok(())
}

#[test]
fn builtin_string_hash_code() -> Result<()> {
	let source = "\
.class public LHash;
.super Ljava/lang/Object;

.method public static hash(Ljava/lang/String;)I
    .locals 1
    invoke-virtual {p0}, Ljava/lang/String;->hashCode()I
    move-result v0
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("hash(Ljava/lang/String;)I")?;
	assert_eq!(
		vm.call(&method, None, &[Value::String("hello".to_owned())])?,
		Value::Int(99162322),
	);
	Ok(())
}

#[test]
fn builtin_get_class_and_names() -> Result<()> {
	let source = "\
.class public LWho;
.super Ljava/lang/Object;

.method public constructor <init>()V
    .locals 0
    return-void
.end method

.method public static name()Ljava/lang/String;
    .locals 1
    new-instance v0, LWho;
    invoke-virtual {v0}, Ljava/lang/Object;->getClass()Ljava/lang/Class;
    move-result-object v0
    invoke-virtual {v0}, Ljava/lang/Class;->getSimpleName()Ljava/lang/String;
    move-result-object v0
    return-object v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("name()Ljava/lang/String;")?;
	assert_eq!(vm.call(&method, None, &[])?, Value::String("Who".to_owned()));
	Ok(())
}

#[test]
fn throw_surfaces_as_an_execution_error() -> Result<()> {
	let source = "\
.class public LThrows;
.super Ljava/lang/Object;

.method public static boom()V
    .locals 1
    const-string v0, \"kaboom\"
    throw v0
    return-void
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("boom()V")?;

	let error = vm.call(&method, None, &[]).unwrap_err();
	assert_eq!(error.execution_name(), Some("RuntimeError"));
	assert!(error.to_string().contains("kaboom"));
	Ok(())
}

#[test]
fn assignability_walks_the_super_chain() -> Result<()> {
	let base = "\
.class public LBase;
.super Ljava/lang/Object;
";
	let derived = "\
.class public LDerived;
.super LBase;
";
	let vm = SmaliVm::new();
	let base = vm.load_class(base, true, false)?;
	let derived = vm.load_class(derived, true, false)?;

	assert!(base.is_assignable(&derived, &vm));
	assert!(base.is_assignable(&base, &vm));
	assert!(!derived.is_assignable(&base, &vm));
	Ok(())
}

#[test]
fn check_cast_rejects_unrelated_classes() -> Result<()> {
	let base = "\
.class public LAnimal;
.super Ljava/lang/Object;

.method public constructor <init>()V
    .locals 0
    return-void
.end method
";
	let derived = "\
.class public LCat;
.super LAnimal;

.method public constructor <init>()V
    .locals 0
    return-void
.end method

.method public static upcast()LAnimal;
    .locals 1
    new-instance v0, LCat;
    check-cast v0, LAnimal;
    return-object v0
.end method

.method public static miscast()LCat;
    .locals 1
    new-instance v0, LAnimal;
    check-cast v0, LCat;
    return-object v0
.end method
";
	let vm = SmaliVm::new();
	vm.load_class(base, true, false)?;
	let cat = vm.load_class(derived, true, false)?;

	let upcast = cat.method("upcast()LAnimal;")?;
	assert!(vm.call(&upcast, None, &[]).is_ok());

	let miscast = cat.method("miscast()LCat;")?;
	let error = vm.call(&miscast, None, &[]).unwrap_err();
	assert_eq!(error.execution_name(), Some("ClassCastError"));
	Ok(())
}

#[test]
fn missing_lookups_report_their_kind() -> Result<()> {
	let source = "\
.class public LLookups;
.super Ljava/lang/Object;

.method public static readMissing()I
    .locals 1
    return v5
.end method
";
	let vm = SmaliVm::new();
	assert!(matches!(vm.get_class("LNope;"), Err(VmError::NoSuchClass(_))));

	let class = vm.load_class(source, true, false)?;
	assert!(matches!(class.field("nope"), Err(VmError::NoSuchField(_))));
	assert!(matches!(class.method("nope()V"), Err(VmError::NoSuchMethod(_))));

	let method = class.method("readMissing()I")?;
	assert!(matches!(vm.call(&method, None, &[]), Err(VmError::NoSuchRegister(_))));
	Ok(())
}

#[test]
fn unknown_opcodes_follow_the_strict_flag() {
	let source = "\
.class public LUnknown;
.super Ljava/lang/Object;

.method public static f()V
    .locals 0
    frobnicate v0
    return-void
.end method
";
	let strict = SmaliVm::with_options(OpcodeTable::standard(), true);
	let error = strict.load_class(source, true, false).unwrap_err();
	assert!(format!("{error:#}").contains("invalid opcode"));

	let lenient = SmaliVm::new();
	let class = lenient.load_class(source, true, false).expect("lenient mode substitutes a no-op");
	let method = class.method("f()V").expect("method is present");
	assert_eq!(lenient.call(&method, None, &[]).expect("runs as a no-op"), Value::Null);
}

#[test]
fn final_fields_are_read_only() -> Result<()> {
	let source = "\
.class public LSealed;
.super Ljava/lang/Object;

.field public final y:I

.method public constructor <init>()V
    .locals 0
    return-void
.end method

.method public static demo()V
    .locals 2
    new-instance v0, LSealed;
    const/4 v1, 0x1
    iput v1, v0, LSealed;->y:I
    return-void
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("demo()V")?;

	let error = vm.call(&method, None, &[]).unwrap_err();
	assert!(matches!(error, VmError::Unsupported(_)));
	Ok(())
}

#[test]
fn abstract_classes_cannot_be_instantiated() -> Result<()> {
	let source = "\
.class public abstract LAbs;
.super Ljava/lang/Object;
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	assert!(matches!(SmaliObject::new(&class), Err(VmError::Unsupported(_))));
	Ok(())
}

#[test]
fn argument_validation() -> Result<()> {
	let source = "\
.class public LArgs;
.super Ljava/lang/Object;

.method public static twice(I)I
    .locals 1
    add-int v0, p0, p0
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("twice(I)I")?;

	assert_eq!(vm.call(&method, None, &[Value::Int(4)])?, Value::Int(8));

	let wrong_count = vm.call(&method, None, &[]).unwrap_err();
	assert_eq!(wrong_count.execution_name(), Some("ArgumentError"));

	let wrong_type = vm.call(&method, None, &[Value::String("x".to_owned())]).unwrap_err();
	assert_eq!(wrong_type.execution_name(), Some("TypeError"));
	Ok(())
}

#[test]
fn new_instance_coerces_well_known_descriptors() -> Result<()> {
	let source = "\
.class public LZeros;
.super Ljava/lang/Object;

.method public static emptyString()Ljava/lang/String;
    .locals 1
    new-instance v0, Ljava/lang/String;
    return-object v0
.end method

.method public static zeroInt()I
    .locals 1
    new-instance v0, Ljava/lang/Integer;
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;

	let empty = class.method("emptyString()Ljava/lang/String;")?;
	assert_eq!(vm.call(&empty, None, &[])?, Value::String(String::new()));

	let zero = class.method("zeroInt()I")?;
	assert_eq!(vm.call(&zero, None, &[])?, Value::Int(0));
	Ok(())
}

#[test]
fn fill_array_data_loads_the_payload() -> Result<()> {
	let source = "\
.class public LFill;
.super Ljava/lang/Object;

.method public static sizes()[I
    .locals 1
    fill-array-data v0, :data
    return-object v0
    :data
    .array-data 4
        0x1
        0x2
        0x3
    .end array-data
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("sizes()[I")?;

	let result = vm.call(&method, None, &[])?;
	let Value::Array(array) = result else {
		panic!("expected an array");
	};
	assert_eq!(*array.borrow(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
	Ok(())
}

#[test]
fn annotations_reach_the_class_model() -> Result<()> {
	let source = "\
.class public LTagged;
.super Ljava/lang/Object;

.annotation runtime Lcom/example/Tag;
    value = \"t\"
.end annotation
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;

	assert!(class.is_annotation_present("Lcom/example/Tag;"));
	let annotations = class.get_annotations("Lcom/example/Tag;");
	assert_eq!(annotations.len(), 1);
	assert!(annotations[0].contains("value"));
	Ok(())
}

#[test]
fn null_receivers_are_rejected() -> Result<()> {
	let source = "\
.class public LRecv;
.super Ljava/lang/Object;

.method public id()I
    .locals 1
    const/4 v0, 0x5
    return v0
.end method
";
	let vm = SmaliVm::new();
	let class = vm.load_class(source, true, false)?;
	let method = class.method("id()I")?;

	let error = vm.call(&method, None, &[]).unwrap_err();
	assert_eq!(error.execution_name(), Some("NullPointerError"));
	Ok(())
}
