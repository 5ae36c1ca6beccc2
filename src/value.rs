//! The primitive value taxonomy a leaf writer emits (spec §3), mirrored
//! against [`parquet::data_type`]'s physical types so a real
//! [`crate::buffer::ColumnBuffer`] can forward straight into
//! `parquet::column::writer::ColumnWriter`.

use parquet::data_type::{ByteArray, FixedLenByteArray};

/// One shredded value plus the levels it carries.
#[derive(Debug, Clone)]
pub struct Value {
	pub repetition_level: u8,
	pub definition_level: u8,
	pub data: ValueData,
}

impl Value {
	pub fn new(repetition_level: u8, definition_level: u8, data: ValueData) -> Self {
		Value { repetition_level, definition_level, data }
	}

	pub fn null(repetition_level: u8, definition_level: u8) -> Self {
		Value { repetition_level, definition_level, data: ValueData::Null }
	}
}

/// Physical payload, one variant per `parquet` physical type plus
/// `Null` for a value below the column's max definition level.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
	Null,
	Boolean(bool),
	Int32(i32),
	Int64(i64),
	Int96(parquet::data_type::Int96),
	Float(f32),
	Double(f64),
	ByteArray(ByteArray),
	FixedLenByteArray(FixedLenByteArray),
}

impl ValueData {
	pub fn is_null(&self) -> bool {
		matches!(self, ValueData::Null)
	}
}

impl From<bool> for ValueData {
	fn from(v: bool) -> Self { ValueData::Boolean(v) }
}
impl From<i32> for ValueData {
	fn from(v: i32) -> Self { ValueData::Int32(v) }
}
impl From<i64> for ValueData {
	fn from(v: i64) -> Self { ValueData::Int64(v) }
}
impl From<f32> for ValueData {
	fn from(v: f32) -> Self { ValueData::Float(v) }
}
impl From<f64> for ValueData {
	fn from(v: f64) -> Self { ValueData::Double(v) }
}
impl From<ByteArray> for ValueData {
	fn from(v: ByteArray) -> Self { ValueData::ByteArray(v) }
}
impl From<FixedLenByteArray> for ValueData {
	fn from(v: FixedLenByteArray) -> Self { ValueData::FixedLenByteArray(v) }
}

/// The Rust-level scalar a [`crate::shape::RecordShape::Leaf`] stores
/// (spec §4.1 rules 1-9); several source scalars widen to the same
/// physical kind (e.g. `i8`/`i16`/`i32` all become `Int32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScalar {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	/// Architecture-width signed/unsigned integer (spec §4.1 rule 3), widened to `Int64`.
	ArchInt,
	F32,
	F64,
	String,
	/// `Vec<u8>` (spec §4.1 rule 7), laid out identically to `String` (ptr/len/cap).
	Bytes,
	/// Distinguished 96-bit integer type (spec §4.1 rule 1).
	Int96,
	/// Fixed-length byte array of `len` bytes (spec §4.1 rule 9); `len == 16` is the UUID case.
	FixedBytes { len: usize },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn null_value_carries_no_payload() {
		let v = Value::null(1, 2);
		assert!(v.data.is_null());
		assert_eq!(v.repetition_level, 1);
		assert_eq!(v.definition_level, 2);
	}
}
