//! `RecordShape`: the hand-built structural description that stands in
//! for source-language reflection (spec §4.1, §9 Open Question #1).
//! Built by hand once per record type and handed to
//! [`crate::plan::build_plan`] alongside a [`crate::schema::SchemaLookup`].
//!
//! `Pointer`/`Slice`/`Map` shapes carry an accessor: a non-capturing
//! function, monomorphized for the concrete `Option<Box<T>>`/`Vec<T>`/
//! `HashMap<K, V>` at the shape-building call site, that reaches into
//! the field's raw bytes using only safe standard-library methods
//! (`Vec::as_ptr`, `Option::as_deref`, `HashMap::iter`) rather than
//! reinterpreting either type's private byte layout directly.

use crate::value::SourceScalar;

/// One field of a [`RecordShape`]: its byte offset within the parent
/// record, the shape of what lives there, and the repetition/optional
/// tag that governs how the plan builder wraps it (spec §4.1 rules
/// 3-10).
#[derive(Clone)]
pub struct FieldShape {
	pub name: &'static str,
	pub offset: usize,
	pub shape: Box<RecordShape>,
	pub tag: FieldTag,
}

/// Spec §4.1's repetition/optionality tag, attached per field since the
/// same element shape can appear both bare and behind a `Vec`/`Option`
/// depending on which field holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
	/// A plain, always-present field.
	Plain,
	/// Scalar field under the null-by-zero policy (spec §3 "(ADDED)").
	/// Only valid when `shape` is a `Leaf`.
	Optional,
	/// `Option<Box<_>>`, explicit nilable pointer (spec §4.1 rule 6/9).
	Pointer,
	/// `Vec<_>`, repeated field (spec §4.1 rule 7).
	Slice,
	/// `HashMap<_, _>`, key/value repeated pair (spec §4.1 rule 8).
	Map,
}

/// Given the address of an `Option<Box<T>>`, returns the address of the
/// boxed `T` if present. Built once per `T` by [`pointer_accessor`].
pub type PointerAccessor = fn(*const u8) -> Option<*const u8>;

/// Given the address of a `Vec<T>`, returns `(data_ptr, len)`. Built
/// once per `T` by [`slice_accessor`].
pub type SliceAccessor = fn(*const u8) -> (*const u8, usize);

/// Given the address of a `HashMap<K, V>`, returns the addresses of
/// every `(key, value)` pair in the map's iteration order (spec §4.6,
/// unspecified order). Built once per `(K, V)` by [`map_accessor`].
pub type MapAccessor = fn(*const u8) -> Vec<(*const u8, *const u8)>;

/// Builds a [`PointerAccessor`] for `Option<Box<T>>`, monomorphized at
/// the call site where `T` is concrete.
///
/// # Safety
/// The caller must guarantee every address this accessor is later
/// invoked with genuinely points at a live `Option<Box<T>>`.
pub fn pointer_accessor<T>() -> PointerAccessor {
	|base| unsafe {
		let opt = &*(base as *const Option<Box<T>>);
		opt.as_deref().map(|r| r as *const T as *const u8)
	}
}

/// Builds a [`SliceAccessor`] for `Vec<T>`.
///
/// # Safety
/// Same obligation as [`pointer_accessor`], for `Vec<T>`.
pub fn slice_accessor<T>() -> SliceAccessor {
	|base| unsafe {
		let v = &*(base as *const Vec<T>);
		(v.as_ptr() as *const u8, v.len())
	}
}

/// Builds a [`MapAccessor`] for `HashMap<K, V>`.
///
/// # Safety
/// Same obligation as [`pointer_accessor`], for `HashMap<K, V>`.
pub fn map_accessor<K, V>() -> MapAccessor
where
	K: std::hash::Hash + Eq,
{
	|base| unsafe {
		let m = &*(base as *const std::collections::HashMap<K, V>);
		m.iter()
			.map(|(k, v)| (k as *const K as *const u8, v as *const V as *const u8))
			.collect()
	}
}

/// The structural shape of one Rust type as it appears in a record
/// batch. Recursive: a `Struct`'s fields each carry their own shape,
/// and `Slice`/`Map`/`Pointer` carry the shape of what they contain.
#[derive(Clone)]
pub enum RecordShape {
	/// A scalar; see [`SourceScalar`] for the source-width/physical-kind
	/// split. `FixedBytes` (rule 9, including the 16-byte UUID case) is
	/// `Leaf(SourceScalar::FixedBytes { len })`.
	Leaf(SourceScalar),
	Struct(Vec<FieldShape>),
	/// `Vec<T>`: `elem_size` is `size_of::<T>()`.
	Slice { elem_size: usize, elem: Box<RecordShape>, accessor: SliceAccessor },
	/// `HashMap<K, V>`, represented as two parallel slice-shaped
	/// iterations (spec §4.1 rule 8).
	Map { key_size: usize, key: Box<RecordShape>, value_size: usize, value: Box<RecordShape>, accessor: MapAccessor },
	/// `Option<Box<T>>`.
	Pointer { elem_size: usize, elem: Box<RecordShape>, accessor: PointerAccessor },
}

impl RecordShape {
	pub fn leaf(source: SourceScalar) -> Self {
		RecordShape::Leaf(source)
	}

	pub fn struct_of(fields: Vec<FieldShape>) -> Self {
		RecordShape::Struct(fields)
	}

	pub fn slice_of<T>(elem: RecordShape) -> Self {
		RecordShape::Slice { elem_size: std::mem::size_of::<T>(), elem: Box::new(elem), accessor: slice_accessor::<T>() }
	}

	pub fn pointer_to<T>(elem: RecordShape) -> Self {
		RecordShape::Pointer { elem_size: std::mem::size_of::<T>(), elem: Box::new(elem), accessor: pointer_accessor::<T>() }
	}

	pub fn map_of<K, V>(key: RecordShape, value: RecordShape) -> Self
	where
		K: std::hash::Hash + Eq,
	{
		RecordShape::Map {
			key_size: std::mem::size_of::<K>(),
			key: Box::new(key),
			value_size: std::mem::size_of::<V>(),
			value: Box::new(value),
			accessor: map_accessor::<K, V>(),
		}
	}
}

/// Builder helper for describing a `#[repr(C)]` struct field by field;
/// `FieldShape` literals work just as well for hand-rolled shapes.
pub struct StructShapeBuilder {
	fields: Vec<FieldShape>,
}

impl StructShapeBuilder {
	pub fn new() -> Self {
		StructShapeBuilder { fields: Vec::new() }
	}

	pub fn field(mut self, name: &'static str, offset: usize, shape: RecordShape, tag: FieldTag) -> Self {
		self.fields.push(FieldShape { name, offset, shape: Box::new(shape), tag });
		self
	}

	pub fn build(self) -> RecordShape {
		RecordShape::Struct(self.fields)
	}
}

impl Default for StructShapeBuilder {
	fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_preserves_field_order_and_offsets() {
		let shape = StructShapeBuilder::new()
			.field("id", 0, RecordShape::leaf(SourceScalar::I32), FieldTag::Plain)
			.field("name", 8, RecordShape::leaf(SourceScalar::String), FieldTag::Optional)
			.build();

		match shape {
			RecordShape::Struct(fields) => {
				assert_eq!(fields.len(), 2);
				assert_eq!(fields[0].name, "id");
				assert_eq!(fields[1].offset, 8);
				assert_eq!(fields[1].tag, FieldTag::Optional);
			}
			_ => panic!("expected Struct"),
		}
	}

	#[test]
	fn slice_accessor_reads_vec_data_ptr_and_len() {
		let v: Vec<i32> = vec![10, 20, 30];
		let accessor = slice_accessor::<i32>();
		let (ptr, len) = accessor(&v as *const Vec<i32> as *const u8);
		assert_eq!(len, 3);
		let read_back = unsafe { std::slice::from_raw_parts(ptr as *const i32, len) };
		assert_eq!(read_back, &[10, 20, 30]);
	}

	#[test]
	fn pointer_accessor_distinguishes_none_from_some() {
		let none: Option<Box<i32>> = None;
		let some: Option<Box<i32>> = Some(Box::new(42));
		let accessor = pointer_accessor::<i32>();
		assert!(accessor(&none as *const Option<Box<i32>> as *const u8).is_none());
		let addr = accessor(&some as *const Option<Box<i32>> as *const u8).unwrap();
		assert_eq!(unsafe { *(addr as *const i32) }, 42);
	}

	#[test]
	fn map_accessor_enumerates_every_entry() {
		use std::collections::HashMap;
		let mut m: HashMap<String, i32> = HashMap::new();
		m.insert("x".to_string(), 1);
		m.insert("y".to_string(), 2);
		let accessor = map_accessor::<String, i32>();
		let entries = accessor(&m as *const HashMap<String, i32> as *const u8);
		assert_eq!(entries.len(), 2);
		let mut values: Vec<i32> = entries.iter().map(|(_, v)| unsafe { *(*v as *const i32) }).collect();
		values.sort();
		assert_eq!(values, vec![1, 2]);
	}
}
