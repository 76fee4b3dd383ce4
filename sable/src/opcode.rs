//! Opcode name constants.
//!
//! Only the names the reader and the executors refer to are listed; the
//! typed variants of an opcode family (`aget-byte`, `sput-char`, …) alias
//! the family's generic executor.

pub const NOP: &str = "nop";

pub const RETURN: &str = "return";
pub const RETURN_VOID: &str = "return-void";
pub const RETURN_VOID_BARRIER: &str = "return-void-barrier";
pub const RETURN_VOID_NO_BARRIER: &str = "return-void-no-barrier";
pub const RETURN_WIDE: &str = "return-wide";
pub const RETURN_OBJECT: &str = "return-object";

pub const GOTO: &str = "goto";
pub const GOTO_16: &str = "goto/16";
pub const GOTO_32: &str = "goto/32";

pub const INVOKE: &str = "invoke";
pub const THROW: &str = "throw";

pub const CONST: &str = "const";
pub const CONST_4: &str = "const/4";
pub const CONST_16: &str = "const/16";
pub const CONST_HIGH16: &str = "const/high16";
pub const CONST_WIDE: &str = "const-wide";
pub const CONST_WIDE_16: &str = "const-wide/16";
pub const CONST_WIDE_32: &str = "const-wide/32";
pub const CONST_WIDE_HIGH16: &str = "const-wide/high16";
pub const CONST_STRING: &str = "const-string";
pub const CONST_STRING_JUMBO: &str = "const-string/jumbo";
pub const CONST_CLASS: &str = "const-class";

pub const MOVE: &str = "move";
pub const MOVE_16: &str = "move/16";
pub const MOVE_FROM16: &str = "move/from16";
pub const MOVE_WIDE: &str = "move-wide";
pub const MOVE_WIDE_16: &str = "move-wide/16";
pub const MOVE_WIDE_FROM16: &str = "move-wide/from16";
pub const MOVE_OBJECT: &str = "move-object";
pub const MOVE_OBJECT_16: &str = "move-object/16";
pub const MOVE_OBJECT_FROM16: &str = "move-object/from16";
pub const MOVE_RESULT: &str = "move-result";
pub const MOVE_RESULT_WIDE: &str = "move-result-wide";
pub const MOVE_RESULT_OBJECT: &str = "move-result-object";
pub const MOVE_EXCEPTION: &str = "move-exception";

pub const NEW_INSTANCE: &str = "new-instance";
pub const NEW_ARRAY: &str = "new-array";
pub const CHECK_CAST: &str = "check-cast";
pub const INSTANCE_OF: &str = "instance-of";

pub const ARRAY_LENGTH: &str = "array-length";
pub const FILL_ARRAY_DATA: &str = "fill-array-data";
pub const AGET: &str = "aget";
pub const AGET_WIDE: &str = "aget-wide";
pub const AGET_OBJECT: &str = "aget-object";
pub const AGET_BOOLEAN: &str = "aget-boolean";
pub const AGET_BYTE: &str = "aget-byte";
pub const AGET_CHAR: &str = "aget-char";
pub const AGET_SHORT: &str = "aget-short";
pub const APUT: &str = "aput";
pub const APUT_WIDE: &str = "aput-wide";
pub const APUT_OBJECT: &str = "aput-object";
pub const APUT_BOOLEAN: &str = "aput-boolean";
pub const APUT_BYTE: &str = "aput-byte";
pub const APUT_CHAR: &str = "aput-char";
pub const APUT_SHORT: &str = "aput-short";

pub const SGET: &str = "sget";
pub const SGET_WIDE: &str = "sget-wide";
pub const SGET_OBJECT: &str = "sget-object";
pub const SGET_BOOLEAN: &str = "sget-boolean";
pub const SGET_BYTE: &str = "sget-byte";
pub const SGET_CHAR: &str = "sget-char";
pub const SGET_SHORT: &str = "sget-short";
pub const SPUT: &str = "sput";
pub const SPUT_WIDE: &str = "sput-wide";
pub const SPUT_OBJECT: &str = "sput-object";
pub const SPUT_BOOLEAN: &str = "sput-boolean";
pub const SPUT_BYTE: &str = "sput-byte";
pub const SPUT_CHAR: &str = "sput-char";
pub const SPUT_SHORT: &str = "sput-short";

pub const IGET: &str = "iget";
pub const IGET_WIDE: &str = "iget-wide";
pub const IGET_OBJECT: &str = "iget-object";
pub const IGET_BOOLEAN: &str = "iget-boolean";
pub const IGET_BYTE: &str = "iget-byte";
pub const IGET_CHAR: &str = "iget-char";
pub const IGET_SHORT: &str = "iget-short";
pub const IPUT: &str = "iput";
pub const IPUT_WIDE: &str = "iput-wide";
pub const IPUT_OBJECT: &str = "iput-object";
pub const IPUT_BOOLEAN: &str = "iput-boolean";
pub const IPUT_BYTE: &str = "iput-byte";
pub const IPUT_CHAR: &str = "iput-char";
pub const IPUT_SHORT: &str = "iput-short";

pub const PACKED_SWITCH: &str = "packed-switch";
pub const SPARSE_SWITCH: &str = "sparse-switch";

pub const IF_EQ: &str = "if-eq";
pub const IF_NE: &str = "if-ne";
pub const IF_LT: &str = "if-lt";
pub const IF_LE: &str = "if-le";
pub const IF_GT: &str = "if-gt";
pub const IF_GE: &str = "if-ge";
pub const IF_EQZ: &str = "if-eqz";
pub const IF_NEZ: &str = "if-nez";
pub const IF_LTZ: &str = "if-ltz";
pub const IF_LEZ: &str = "if-lez";
pub const IF_GTZ: &str = "if-gtz";
pub const IF_GEZ: &str = "if-gez";

pub const NEG_INT: &str = "neg-int";
pub const NEG_LONG: &str = "neg-long";
pub const NEG_FLOAT: &str = "neg-float";
pub const NEG_DOUBLE: &str = "neg-double";
pub const NOT_INT: &str = "not-int";
pub const NOT_LONG: &str = "not-long";

pub const INT_TO_LONG: &str = "int-to-long";
pub const INT_TO_BYTE: &str = "int-to-byte";
pub const INT_TO_CHAR: &str = "int-to-char";
pub const INT_TO_SHORT: &str = "int-to-short";
pub const INT_TO_FLOAT: &str = "int-to-float";
pub const INT_TO_DOUBLE: &str = "int-to-double";
pub const LONG_TO_INT: &str = "long-to-int";

pub const ADD_INT: &str = "add-int";
pub const SUB_INT: &str = "sub-int";
pub const MUL_INT: &str = "mul-int";
pub const DIV_INT: &str = "div-int";
pub const REM_INT: &str = "rem-int";
pub const AND_INT: &str = "and-int";
pub const OR_INT: &str = "or-int";
pub const XOR_INT: &str = "xor-int";
pub const SHL_INT: &str = "shl-int";
pub const SHR_INT: &str = "shr-int";
pub const USHR_INT: &str = "ushr-int";

pub const ADD_LONG: &str = "add-long";
pub const SUB_LONG: &str = "sub-long";
pub const MUL_LONG: &str = "mul-long";
pub const DIV_LONG: &str = "div-long";
pub const REM_LONG: &str = "rem-long";
pub const AND_LONG: &str = "and-long";
pub const OR_LONG: &str = "or-long";
pub const XOR_LONG: &str = "xor-long";
pub const SHL_LONG: &str = "shl-long";
pub const SHR_LONG: &str = "shr-long";
pub const USHR_LONG: &str = "ushr-long";

pub const ADD_FLOAT: &str = "add-float";
pub const SUB_FLOAT: &str = "sub-float";
pub const MUL_FLOAT: &str = "mul-float";
pub const DIV_FLOAT: &str = "div-float";
pub const REM_FLOAT: &str = "rem-float";
pub const ADD_DOUBLE: &str = "add-double";
pub const SUB_DOUBLE: &str = "sub-double";
pub const MUL_DOUBLE: &str = "mul-double";
pub const DIV_DOUBLE: &str = "div-double";
pub const REM_DOUBLE: &str = "rem-double";

pub const ADD_INT_2ADDR: &str = "add-int/2addr";
pub const SUB_INT_2ADDR: &str = "sub-int/2addr";
pub const MUL_INT_2ADDR: &str = "mul-int/2addr";
pub const DIV_INT_2ADDR: &str = "div-int/2addr";
pub const REM_INT_2ADDR: &str = "rem-int/2addr";
pub const AND_INT_2ADDR: &str = "and-int/2addr";
pub const OR_INT_2ADDR: &str = "or-int/2addr";
pub const XOR_INT_2ADDR: &str = "xor-int/2addr";
pub const SHL_INT_2ADDR: &str = "shl-int/2addr";
pub const SHR_INT_2ADDR: &str = "shr-int/2addr";
pub const USHR_INT_2ADDR: &str = "ushr-int/2addr";

pub const ADD_LONG_2ADDR: &str = "add-long/2addr";
pub const SUB_LONG_2ADDR: &str = "sub-long/2addr";
pub const MUL_LONG_2ADDR: &str = "mul-long/2addr";
pub const DIV_LONG_2ADDR: &str = "div-long/2addr";
pub const REM_LONG_2ADDR: &str = "rem-long/2addr";
pub const AND_LONG_2ADDR: &str = "and-long/2addr";
pub const OR_LONG_2ADDR: &str = "or-long/2addr";
pub const XOR_LONG_2ADDR: &str = "xor-long/2addr";
pub const SHL_LONG_2ADDR: &str = "shl-long/2addr";
pub const SHR_LONG_2ADDR: &str = "shr-long/2addr";
pub const USHR_LONG_2ADDR: &str = "ushr-long/2addr";

pub const ADD_FLOAT_2ADDR: &str = "add-float/2addr";
pub const SUB_FLOAT_2ADDR: &str = "sub-float/2addr";
pub const MUL_FLOAT_2ADDR: &str = "mul-float/2addr";
pub const DIV_FLOAT_2ADDR: &str = "div-float/2addr";
pub const REM_FLOAT_2ADDR: &str = "rem-float/2addr";
pub const ADD_DOUBLE_2ADDR: &str = "add-double/2addr";
pub const SUB_DOUBLE_2ADDR: &str = "sub-double/2addr";
pub const MUL_DOUBLE_2ADDR: &str = "mul-double/2addr";
pub const DIV_DOUBLE_2ADDR: &str = "div-double/2addr";
pub const REM_DOUBLE_2ADDR: &str = "rem-double/2addr";

pub const ADD_INT_LIT8: &str = "add-int/lit8";
pub const ADD_INT_LIT16: &str = "add-int/lit16";
pub const RSUB_INT: &str = "rsub-int";
pub const RSUB_INT_LIT8: &str = "rsub-int/lit8";
pub const MUL_INT_LIT8: &str = "mul-int/lit8";
pub const MUL_INT_LIT16: &str = "mul-int/lit16";
pub const DIV_INT_LIT8: &str = "div-int/lit8";
pub const DIV_INT_LIT16: &str = "div-int/lit16";
pub const REM_INT_LIT8: &str = "rem-int/lit8";
pub const REM_INT_LIT16: &str = "rem-int/lit16";
pub const AND_INT_LIT8: &str = "and-int/lit8";
pub const AND_INT_LIT16: &str = "and-int/lit16";
pub const OR_INT_LIT8: &str = "or-int/lit8";
pub const OR_INT_LIT16: &str = "or-int/lit16";
pub const XOR_INT_LIT8: &str = "xor-int/lit8";
pub const XOR_INT_LIT16: &str = "xor-int/lit16";
pub const SHL_INT_LIT8: &str = "shl-int/lit8";
pub const SHR_INT_LIT8: &str = "shr-int/lit8";
pub const USHR_INT_LIT8: &str = "ushr-int/lit8";
