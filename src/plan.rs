//! L3: the writer plan tree and the builder that turns a
//! [`RecordShape`] + [`SchemaLookup`] pair into one, built once per
//! record shape and walked on every batch thereafter (spec §4.1).
//!
//! Grounded on `postgres_cloner.rs::map_schema_column`/`map_simple_type`,
//! which perform the equivalent dispatch over Postgres OIDs; the type
//! dispatch rules here are the Rust-shape equivalent (spec §4.1 rules
//! 1-12), resolved ahead of time instead of per row.

use crate::error::PlanError;
use crate::schema::{ColumnPath, SchemaLookup};
use crate::shape::{FieldTag, MapAccessor, PointerAccessor, RecordShape, SliceAccessor};
use crate::value::SourceScalar;

/// One node of the writer plan. Built once, walked read-only by
/// [`crate::composite`] for every batch.
#[derive(Debug, Clone)]
pub enum WriterPlan {
	Leaf { source: SourceScalar, column_index: i16 },
	FixedBytes { len: usize, column_index: i16 },
	Struct(Vec<StructField>),
	/// `in_root` is true only for the plan's single outermost node when
	/// that node is itself a pointer (spec §4.1 rule 10, §4.4).
	Pointer { elem_size: usize, child: Box<WriterPlan>, in_root: bool, accessor: PointerAccessor },
	Slice { elem_size: usize, child: Box<WriterPlan>, accessor: SliceAccessor },
	Map { key_size: usize, key: Box<WriterPlan>, value_size: usize, value: Box<WriterPlan>, accessor: MapAccessor },
	/// Wraps a scalar leaf under the null-by-zero policy. Never wraps a
	/// `Pointer` or `Slice` child (spec §4.1 rule 11).
	Optional { child: Box<WriterPlan> },
}

#[derive(Debug, Clone)]
pub struct StructField {
	pub column_index: i16,
	pub field_offset: usize,
	pub child: Box<WriterPlan>,
}

/// Builds a [`WriterPlan`] for `shape` at `path`, resolving leaf
/// columns through `schema`.
pub fn build_plan(shape: &RecordShape, schema: &dyn SchemaLookup, path: &ColumnPath) -> Result<WriterPlan, PlanError> {
	build_plan_inner(shape, schema, path, true)
}

fn build_plan_inner(
	shape: &RecordShape,
	schema: &dyn SchemaLookup,
	path: &ColumnPath,
	is_plan_root: bool,
) -> Result<WriterPlan, PlanError> {
	match shape {
		RecordShape::Leaf(source) => {
			let column_index = resolve_leaf(schema, path)?;
			if let SourceScalar::FixedBytes { len } = source {
				Ok(WriterPlan::FixedBytes { len: *len, column_index })
			} else {
				Ok(WriterPlan::Leaf { source: *source, column_index })
			}
		}
		RecordShape::Struct(fields) => {
			let mut built = Vec::with_capacity(fields.len());
			for field in fields {
				// list/key_value path segments are injected by the
				// Slice/Map arms below, so a field's own path is just its
				// name regardless of the field's tag.
				let field_path = path.child(field.name);

				let mut child_plan = build_plan_inner(&field.shape, schema, &field_path, false)?;

				if field.tag == FieldTag::Optional {
					child_plan = match child_plan {
						WriterPlan::Pointer { .. } | WriterPlan::Slice { .. } | WriterPlan::Map { .. } => child_plan,
						WriterPlan::Leaf { .. } | WriterPlan::FixedBytes { .. } => WriterPlan::Optional { child: Box::new(child_plan) },
						// A struct has no zero-value representation of
						// "absent" (spec §8), so tagging one optional is a
						// plan-time error.
						WriterPlan::Struct(_) | WriterPlan::Optional { .. } => {
							return Err(PlanError::UnsupportedShape {
								path: field_path.to_string(),
								reason: "field tagged `optional` must resolve to a scalar leaf, pointer, slice, or map".to_string(),
							});
						}
					};
				}

				let column_index = plan_primary_column_index(&child_plan);
				built.push(StructField { column_index, field_offset: field.offset, child: Box::new(child_plan) });
			}
			Ok(WriterPlan::Struct(built))
		}
		RecordShape::Pointer { elem_size, elem, accessor } => {
			let child = build_plan_inner(elem, schema, path, false)?;
			Ok(WriterPlan::Pointer { elem_size: *elem_size, child: Box::new(child), in_root: is_plan_root, accessor: *accessor })
		}
		RecordShape::Slice { elem_size, elem, accessor } => {
			if *elem_size == 1 {
				if let RecordShape::Leaf(SourceScalar::U8) = elem.as_ref() {
					// Rule 7: a slice of bytes is a scalar ByteArray leaf, never a repeated group.
					let column_index = resolve_leaf(schema, path)?;
					return Ok(WriterPlan::Leaf { source: SourceScalar::Bytes, column_index });
				}
			}
			let child = build_plan_inner(elem, schema, &path.list_element(), false)?;
			Ok(WriterPlan::Slice { elem_size: *elem_size, child: Box::new(child), accessor: *accessor })
		}
		RecordShape::Map { key_size, key, value_size, value, accessor } => {
			let key_plan = build_plan_inner(key, schema, &path.map_key(), false)?;
			let value_plan = build_plan_inner(value, schema, &path.map_value(), false)?;
			Ok(WriterPlan::Map {
				key_size: *key_size,
				key: Box::new(key_plan),
				value_size: *value_size,
				value: Box::new(value_plan),
				accessor: *accessor,
			})
		}
	}
}

fn resolve_leaf(schema: &dyn SchemaLookup, path: &ColumnPath) -> Result<i16, PlanError> {
	schema
		.lookup(path)
		.map(|c| c.column_index)
		.ok_or_else(|| PlanError::SchemaColumnMissing { path: path.to_string() })
}

fn plan_primary_column_index(plan: &WriterPlan) -> i16 {
	match plan {
		WriterPlan::Leaf { column_index, .. } => *column_index,
		WriterPlan::FixedBytes { column_index, .. } => *column_index,
		WriterPlan::Optional { child } => plan_primary_column_index(child),
		WriterPlan::Pointer { child, .. } => plan_primary_column_index(child),
		WriterPlan::Slice { child, .. } => plan_primary_column_index(child),
		// A map has two distinct destinations; the key column stands in
		// as the struct field's nominal index.
		WriterPlan::Map { key, .. } => plan_primary_column_index(key),
		WriterPlan::Struct(fields) => fields.first().map(|f| f.column_index).unwrap_or(-1),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::test_support::FixedSchema;
	use crate::shape::StructShapeBuilder;

	#[test]
	fn plain_leaf_resolves_directly() {
		let schema = FixedSchema::new().with("id", 0, 0);
		let shape = RecordShape::leaf(SourceScalar::I32);
		let plan = build_plan(&shape, &schema, &ColumnPath::root().child("id")).unwrap();
		match plan {
			WriterPlan::Leaf { column_index, .. } => assert_eq!(column_index, 0),
			_ => panic!("expected Leaf"),
		}
	}

	#[test]
	fn optional_tag_wraps_scalar_leaf_only() {
		let schema = FixedSchema::new().with("age", 0, 1);
		let shape = StructShapeBuilder::new()
			.field("age", 0, RecordShape::leaf(SourceScalar::I32), FieldTag::Optional)
			.build();
		let plan = build_plan(&shape, &schema, &ColumnPath::root()).unwrap();
		match plan {
			WriterPlan::Struct(fields) => {
				assert!(matches!(*fields[0].child, WriterPlan::Optional { .. }));
			}
			_ => panic!("expected Struct"),
		}
	}

	#[test]
	fn byte_slice_becomes_scalar_byte_array_leaf() {
		let schema = FixedSchema::new().with("data", 0, 0);
		let shape = RecordShape::slice_of::<u8>(RecordShape::leaf(SourceScalar::U8));
		let plan = build_plan(&shape, &schema, &ColumnPath::root().child("data")).unwrap();
		assert!(matches!(plan, WriterPlan::Leaf { source: SourceScalar::Bytes, .. }));
	}

	#[test]
	fn missing_schema_column_is_a_plan_error() {
		let schema = FixedSchema::new();
		let shape = RecordShape::leaf(SourceScalar::I32);
		let err = build_plan(&shape, &schema, &ColumnPath::root().child("missing")).unwrap_err();
		assert!(matches!(err, PlanError::SchemaColumnMissing { .. }));
	}

	#[test]
	fn optional_tag_on_a_struct_field_is_a_plan_error() {
		let schema = FixedSchema::new().with("inner.id", 0, 0);
		let shape = StructShapeBuilder::new()
			.field(
				"inner",
				0,
				StructShapeBuilder::new().field("id", 0, RecordShape::leaf(SourceScalar::I32), FieldTag::Plain).build(),
				FieldTag::Optional,
			)
			.build();
		let err = build_plan(&shape, &schema, &ColumnPath::root()).unwrap_err();
		assert!(matches!(err, PlanError::UnsupportedShape { .. }));
	}
}
