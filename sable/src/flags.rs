use std::fmt::{Debug, Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

/// The access modifiers of classes, fields, methods and annotations.
///
/// This is a plain bitset. Note that the numeric values are not the DEX
/// encoding: DEX reuses flag bits between member kinds, so every modifier
/// gets its own bit here.
///
/// Membership is tested by intersection, so composite flag sets answer
/// queries for a single modifier:
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sable::flags::AccessFlags;
///
/// let flags = AccessFlags::PUBLIC | AccessFlags::FINAL;
/// assert!(flags.contains(AccessFlags::PUBLIC));
/// assert!(!flags.contains(AccessFlags::PRIVATE));
/// assert_eq!(flags.to_names(), vec!["public", "final"]);
/// ```
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct AccessFlags(u32);

impl AccessFlags {
	pub const NONE: AccessFlags = AccessFlags(0);
	pub const PUBLIC: AccessFlags = AccessFlags(0x1);
	pub const PRIVATE: AccessFlags = AccessFlags(0x2);
	pub const PROTECTED: AccessFlags = AccessFlags(0x4);
	pub const STATIC: AccessFlags = AccessFlags(0x8);
	pub const FINAL: AccessFlags = AccessFlags(0x10);
	pub const SYNCHRONIZED: AccessFlags = AccessFlags(0x20);
	pub const VOLATILE: AccessFlags = AccessFlags(0x40);
	pub const BRIDGE: AccessFlags = AccessFlags(0x80);
	pub const TRANSIENT: AccessFlags = AccessFlags(0x100);
	pub const VARARGS: AccessFlags = AccessFlags(0x200);
	pub const NATIVE: AccessFlags = AccessFlags(0x400);
	pub const INTERFACE: AccessFlags = AccessFlags(0x800);
	pub const ABSTRACT: AccessFlags = AccessFlags(0x1000);
	pub const STRICTFP: AccessFlags = AccessFlags(0x2000);
	pub const SYNTHETIC: AccessFlags = AccessFlags(0x4000);
	pub const ANNOTATION: AccessFlags = AccessFlags(0x8000);
	pub const ENUM: AccessFlags = AccessFlags(0x10000);
	pub const CONSTRUCTOR: AccessFlags = AccessFlags(0x20000);
	pub const DECLARED_SYNCHRONIZED: AccessFlags = AccessFlags(0x40000);
	pub const SYSTEM: AccessFlags = AccessFlags(0x80000);
	pub const RUNTIME: AccessFlags = AccessFlags(0x100000);
	pub const BUILD: AccessFlags = AccessFlags(0x200000);

	// declaration order is the rendering order
	const TABLE: &'static [(AccessFlags, &'static str)] = &[
		(AccessFlags::PUBLIC, "public"),
		(AccessFlags::PRIVATE, "private"),
		(AccessFlags::PROTECTED, "protected"),
		(AccessFlags::STATIC, "static"),
		(AccessFlags::FINAL, "final"),
		(AccessFlags::SYNCHRONIZED, "synchronized"),
		(AccessFlags::VOLATILE, "volatile"),
		(AccessFlags::BRIDGE, "bridge"),
		(AccessFlags::TRANSIENT, "transient"),
		(AccessFlags::VARARGS, "varargs"),
		(AccessFlags::NATIVE, "native"),
		(AccessFlags::INTERFACE, "interface"),
		(AccessFlags::ABSTRACT, "abstract"),
		(AccessFlags::STRICTFP, "strictfp"),
		(AccessFlags::SYNTHETIC, "synthetic"),
		(AccessFlags::ANNOTATION, "annotation"),
		(AccessFlags::ENUM, "enum"),
		(AccessFlags::CONSTRUCTOR, "constructor"),
		(AccessFlags::DECLARED_SYNCHRONIZED, "declared-synchronized"),
		(AccessFlags::SYSTEM, "system"),
		(AccessFlags::RUNTIME, "runtime"),
		(AccessFlags::BUILD, "build"),
	];

	/// Converts readable modifier keywords into flags, ignoring anything
	/// that is not a known keyword.
	pub fn from_names<'a>(names: impl IntoIterator<Item=&'a str>) -> AccessFlags {
		let mut result = AccessFlags::NONE;
		for name in names {
			for (flag, flag_name) in AccessFlags::TABLE {
				if *flag_name == name {
					result |= *flag;
				}
			}
		}
		result
	}

	/// The set flags as keywords, in declaration order of the flag table.
	pub fn to_names(self) -> Vec<&'static str> {
		AccessFlags::TABLE.iter()
			.filter(|(flag, _)| self.contains(*flag))
			.map(|(_, name)| *name)
			.collect()
	}

	/// Returns whether the given keyword is a valid modifier.
	pub fn is_known(name: &str) -> bool {
		AccessFlags::TABLE.iter().any(|(_, flag_name)| *flag_name == name)
	}

	/// Intersection test: true when any flag of `other` is set in `self`.
	pub fn contains(self, other: AccessFlags) -> bool {
		self.0 & other.0 != 0
	}

	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn bits(self) -> u32 {
		self.0
	}
}

impl BitOr for AccessFlags {
	type Output = AccessFlags;

	fn bitor(self, rhs: AccessFlags) -> AccessFlags {
		AccessFlags(self.0 | rhs.0)
	}
}

impl BitOrAssign for AccessFlags {
	fn bitor_assign(&mut self, rhs: AccessFlags) {
		self.0 |= rhs.0;
	}
}

impl Debug for AccessFlags {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("AccessFlags { ")?;
		for name in self.to_names() {
			f.write_str(name)?;
			f.write_str(" ")?;
		}
		f.write_str("}")
	}
}

impl Display for AccessFlags {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.to_names().join(" "))
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use super::AccessFlags;

	#[test]
	fn round_trip() {
		let flags = AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::DECLARED_SYNCHRONIZED;
		assert_eq!(AccessFlags::from_names(flags.to_names()), flags);
	}

	#[test]
	fn full_table_round_trip() {
		for (flag, name) in AccessFlags::TABLE {
			assert_eq!(AccessFlags::from_names([*name]), *flag);
			assert_eq!(flag.to_names(), vec![*name]);
		}
	}

	#[test]
	fn order_is_declaration_order() {
		let flags = AccessFlags::FINAL | AccessFlags::PUBLIC | AccessFlags::STATIC;
		assert_eq!(flags.to_names(), vec!["public", "static", "final"]);
	}

	#[test]
	fn unknown_names_are_ignored() {
		assert_eq!(AccessFlags::from_names(["public", "nonsense"]), AccessFlags::PUBLIC);
		assert!(!AccessFlags::is_known("nonsense"));
		assert!(AccessFlags::is_known("declared-synchronized"));
	}
}
