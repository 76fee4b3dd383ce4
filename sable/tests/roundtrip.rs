//! Reader → writer stability: re-emitted sources parse into the same
//! output again.

use pretty_assertions::assert_eq;
use anyhow::Result;
use sable::reader::SmaliReader;
use sable::writer::SmaliWriter;

fn rewrite(reader: &SmaliReader, source: &str) -> Result<String> {
	let mut writer = SmaliWriter::new();
	reader.visit(source, &mut writer)?;
	Ok(writer.code())
}

fn assert_stable(source: &str) -> Result<()> {
	let reader = SmaliReader::new().comments(true);
	let once = rewrite(&reader, source)?;
	let twice = rewrite(&reader, &once)?;
	assert_eq!(once, twice);
	Ok(())
}

#[test]
fn plain_class() -> Result<()> {
	assert_stable("\
.class public Lcom/example/A;
.super Ljava/lang/Object;
.source \"A.java\"
")
}

#[test]
fn fields() -> Result<()> {
	assert_stable("\
.class public Lcom/example/B;
.super Ljava/lang/Object;

.field public static final MAX:I = 0x7f

.field private name:Ljava/lang/String;

.field protected tagged:I
    .annotation runtime Lcom/example/Tag;
        value = \"t\"
    .end annotation
.end field
")
}

#[test]
fn methods() -> Result<()> {
	assert_stable("\
.class public Lcom/example/C;
.super Ljava/lang/Object;

.method public constructor <init>()V
    .locals 0
    .prologue
    invoke-direct {p0}, Ljava/lang/Object;-><init>()V
    return-void
.end method

.method public static max(II)I
    .locals 1
    .param p0, \"a\"
    .param p1, \"b\"
    if-ge p0, p1, :left
    move v0, p1
    return v0
    :left
    move v0, p0
    return v0
.end method
")
}

#[test]
fn switches_and_tables() -> Result<()> {
	assert_stable("\
.class public Lcom/example/D;
.super Ljava/lang/Object;

.method public static pick(I)I
    .locals 1
    packed-switch p0, :table
    const/4 v0, -0x1
    return v0
    :a
    const/4 v0, 0x0
    return v0
    :b
    const/4 v0, 0x1
    return v0
    :table
    .packed-switch 0x0
        :a
        :b
    .end packed-switch
.end method

.method public static sizes()[I
    .locals 1
    fill-array-data v0, :data
    return-object v0
    :data
    .array-data 4
        1
        2
        3
    .end array-data
.end method
")
}

#[test]
fn annotations() -> Result<()> {
	assert_stable("\
.class public Lcom/example/E;
.super Ljava/lang/Object;

.annotation system Ldalvik/annotation/MemberClasses;
    value = {
        Lcom/example/E$A;,
        Lcom/example/E$B;
    }
    single = {}
    kind = .enum Ldalvik/Kind;->MEMBER:Ldalvik/Kind;
    nested = .subannotation Ldalvik/annotation/Inner;
        depth = 2
    .end subannotation
.end annotation
")
}

#[test]
fn comments() -> Result<()> {
	assert_stable("\
.class public Lcom/example/F; # the class
.super Ljava/lang/Object;
# standalone

.method public static f()V
    # body comment
    return-void # done
.end method
")
}

#[test]
fn inner_classes() -> Result<()> {
	assert_stable("\
.class public Lcom/example/G;
.super Ljava/lang/Object;

.field public a:I

.class public Lcom/example/G$H;
.super Ljava/lang/Object;

.field public b:I
")
}
