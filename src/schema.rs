//! Resolves a field path in a [`crate::shape::RecordShape`] to the
//! physical Parquet column it's destined for (spec §6): column index
//! and the max definition level a leaf at that path can legally carry.
//!
//! Grounded on the teacher's `ColumnInfo`, which threads a dotted name
//! path plus running definition/repetition level down through
//! `map_schema_column`'s recursion; this crate separates that into a
//! caller-supplied lookup (the physical schema is build-time data the
//! planner doesn't own) and a [`ColumnPath`] the plan builder grows as
//! it descends.

use std::fmt;

/// A dotted path built by the plan builder as it walks a
/// [`crate::shape::RecordShape`], used as the key a [`SchemaLookup`]
/// resolves against. `list.element` and `map.key`/`map.value` segments
/// are injected the way the Parquet three-level list/map convention
/// requires (spec §4.1 rules 7-8), so a caller's schema can be a plain
/// dotted-path table without re-deriving Parquet's own naming rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ColumnPath {
	segments: Vec<&'static str>,
}

impl ColumnPath {
	pub fn root() -> Self {
		ColumnPath { segments: Vec::new() }
	}

	pub fn child(&self, segment: &'static str) -> Self {
		let mut next = self.segments.clone();
		next.push(segment);
		ColumnPath { segments: next }
	}

	pub fn list_element(&self) -> Self {
		self.child("list").child("element")
	}

	pub fn map_key(&self) -> Self {
		self.child("key_value").child("key")
	}

	pub fn map_value(&self) -> Self {
		self.child("key_value").child("value")
	}

	pub fn segments(&self) -> &[&'static str] {
		&self.segments
	}
}

impl fmt::Display for ColumnPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.segments.join("."))
	}
}

/// The physical destination of a leaf field, as resolved against the
/// target file's Parquet schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
	pub column_index: i16,
	/// The maximum definition level reachable at this column, i.e. the
	/// definition level a fully-present value at this path carries.
	pub max_definition_level: u8,
}

/// Caller-supplied physical schema, queried once per leaf while
/// building a [`crate::plan::WriterPlan`] (spec §6). Implementations
/// typically wrap a `parquet::schema::types::SchemaDescriptor` built
/// from the target file's schema.
pub trait SchemaLookup {
	fn lookup(&self, path: &ColumnPath) -> Option<ResolvedColumn>;
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use std::collections::HashMap;

	/// A fixed in-memory lookup table for tests, keyed by the dotted
	/// path string rather than [`ColumnPath`] directly so test fixtures
	/// can be written as plain string literals.
	#[derive(Default)]
	pub struct FixedSchema {
		columns: HashMap<String, ResolvedColumn>,
	}

	impl FixedSchema {
		pub fn new() -> Self {
			FixedSchema { columns: HashMap::new() }
		}

		pub fn with(mut self, path: &str, column_index: i16, max_definition_level: u8) -> Self {
			self.columns.insert(path.to_string(), ResolvedColumn { column_index, max_definition_level });
			self
		}
	}

	impl SchemaLookup for FixedSchema {
		fn lookup(&self, path: &ColumnPath) -> Option<ResolvedColumn> {
			self.columns.get(&path.to_string()).copied()
		}
	}
}
