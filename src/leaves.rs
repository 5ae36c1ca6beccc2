//! L1: one write routine per primitive column buffer kind (spec §4.8).
//!
//! Grounded on `cli/src/appenders/generic.rs`'s `GenericColumnAppender`
//! for the fast/fallback split, and on `cli/src/appenders/byte_array.rs`
//! / `cli/src/appenders/fixed_byte_array.rs` for the byte-string and
//! fixed-length-byte-array leaves. Where the teacher threads a
//! `LevelIndexList` to let a column buffer derive its own repetition
//! level, this crate passes the already-resolved [`ColumnLevels`]
//! explicitly instead; the batch-level plan already knows the
//! repetition level for a coalesced run before it calls the leaf, so
//! there is nothing left for the buffer to diff against.

use parquet::data_type::{ByteArray, FixedLenByteArray, Int96};

use crate::buffer::ColumnBuffer;
use crate::error::BufferError;
use crate::levels::ColumnLevels;
use crate::region::{gather, RecordRegion};
use crate::value::{SourceScalar, Value, ValueData};
use crate::writer::ScratchBuffer;

/// Writes one leaf occurrence for every element of `region` (spec
/// §4.8). `source` is the scalar's source-width tag (§4.1 rules 3-7);
/// `region` has already been projected to exactly this field.
/// `scratch` is the reusable value buffer the fallback path collects
/// into instead of allocating a fresh `Vec` per call (spec §4.9).
pub fn write_leaf(
	region: &RecordRegion,
	source: SourceScalar,
	levels: ColumnLevels,
	buffer: &mut dyn ColumnBuffer,
	scratch: &mut ScratchBuffer,
) -> Result<usize, BufferError> {
	if region.is_empty() {
		let values = scratch.reset();
		values.push(Value::null(levels.repetition_level, levels.definition_level));
		return buffer.write_values(values.as_slice());
	}

	match source {
		SourceScalar::Bool => write_bool(region, levels, buffer, scratch),
		SourceScalar::I8 => write_widened_i32::<i8>(region, levels, buffer, scratch, |v| v as i32),
		SourceScalar::U8 => write_widened_i32::<u8>(region, levels, buffer, scratch, |v| v as i32),
		SourceScalar::I16 => write_widened_i32::<i16>(region, levels, buffer, scratch, |v| v as i32),
		SourceScalar::U16 => write_widened_i32::<u16>(region, levels, buffer, scratch, |v| v as i32),
		SourceScalar::I32 => write_i32(region, levels, buffer, scratch),
		SourceScalar::U32 => write_widened_i32::<u32>(region, levels, buffer, scratch, |v| v as i32),
		SourceScalar::I64 | SourceScalar::ArchInt => write_i64(region, levels, buffer, scratch),
		SourceScalar::U64 => write_widened_i64::<u64>(region, levels, buffer, scratch, |v| v as i64),
		SourceScalar::F32 => write_f32(region, levels, buffer, scratch),
		SourceScalar::F64 => write_f64(region, levels, buffer, scratch),
		SourceScalar::String => write_strings(region, levels, buffer, scratch),
		SourceScalar::Bytes => write_byte_vecs(region, levels, buffer, scratch),
		SourceScalar::Int96 => write_int96(region, levels, buffer, scratch),
		SourceScalar::FixedBytes { len } => write_fixed_bytes(region, len, levels, buffer, scratch),
	}
}

/// Handles the one case spec §4.1 rule 9 calls out by name: `[u8; 16]`
/// treated as a UUID, which gets the fast-path hint rather than going
/// through the generic `FixedBytes` leaf. Callers that already hold a
/// plan's `WriterPlan::FixedBytes { len, .. }` should dispatch here
/// directly instead of through [`write_leaf`], since `FixedBytes` is a
/// distinct plan node (spec §3), not a `SourceScalar`-tagged `Leaf`.
pub fn write_fixed_bytes(
	region: &RecordRegion,
	len: usize,
	levels: ColumnLevels,
	buffer: &mut dyn ColumnBuffer,
	scratch: &mut ScratchBuffer,
) -> Result<usize, BufferError> {
	if region.is_empty() {
		let values = scratch.reset();
		values.push(Value::null(levels.repetition_level, levels.definition_level));
		return buffer.write_values(values.as_slice());
	}

	let arrays: Vec<FixedLenByteArray> = (0..region.len())
		.map(|i| unsafe { fixed_bytes_at(region, len, i) })
		.collect();

	if let Some(bulk) = buffer.as_fixed_len_byte_array_bulk() {
		return bulk.write_bulk(&arrays, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}

	write_fallback(arrays.into_iter().map(ValueData::FixedLenByteArray), levels, buffer, scratch)
}

unsafe fn fixed_bytes_at(region: &RecordRegion, len: usize, index: usize) -> FixedLenByteArray {
	let ptr = region.get_ref::<u8>(index) as *const u8;
	let bytes = std::slice::from_raw_parts(ptr, len);
	FixedLenByteArray::from(bytes.to_vec())
}

fn write_bool(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<bool>(region);
	if let Some(bulk) = buffer.as_bool_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().map(|v| ValueData::Boolean(*v)), levels, buffer, scratch)
}

fn write_i32(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<i32>(region);
	if let Some(bulk) = buffer.as_i32_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().map(|v| ValueData::Int32(*v)), levels, buffer, scratch)
}

fn write_i64(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<i64>(region);
	if let Some(bulk) = buffer.as_i64_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().map(|v| ValueData::Int64(*v)), levels, buffer, scratch)
}

fn write_f32(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<f32>(region);
	if let Some(bulk) = buffer.as_float_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().map(|v| ValueData::Float(*v)), levels, buffer, scratch)
}

fn write_f64(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<f64>(region);
	if let Some(bulk) = buffer.as_double_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().map(|v| ValueData::Double(*v)), levels, buffer, scratch)
}

fn write_int96(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let values = gather::<Int96>(region);
	if let Some(bulk) = buffer.as_i96_bulk() {
		return bulk.write_bulk(&values, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(values.iter().cloned().map(ValueData::Int96), levels, buffer, scratch)
}

/// `String`/`Vec<u8>` aren't `Copy`, so they're always gathered by
/// cloning one element at a time rather than through [`gather`]; the
/// bulk path already has to materialize an owned `ByteArray` per value
/// either way, so there is no zero-copy case to special-case here.
fn write_strings(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let byte_arrays: Vec<ByteArray> = (0..region.len())
		.map(|i| ByteArray::from(unsafe { region.get_ref::<String>(i) }.as_str()))
		.collect();
	if let Some(bulk) = buffer.as_byte_array_bulk() {
		return bulk.write_bulk(&byte_arrays, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(byte_arrays.into_iter().map(ValueData::ByteArray), levels, buffer, scratch)
}

/// Rule 7: `Vec<u8>` read as raw bytes (not a repeated group).
fn write_byte_vecs(region: &RecordRegion, levels: ColumnLevels, buffer: &mut dyn ColumnBuffer, scratch: &mut ScratchBuffer) -> Result<usize, BufferError> {
	let byte_arrays: Vec<ByteArray> = (0..region.len())
		.map(|i| ByteArray::from(unsafe { region.get_ref::<Vec<u8>>(i) }.clone()))
		.collect();
	if let Some(bulk) = buffer.as_byte_array_bulk() {
		return bulk.write_bulk(&byte_arrays, None, levels.repetition_level, levels.definition_level, levels.definition_level);
	}
	write_fallback(byte_arrays.into_iter().map(ValueData::ByteArray), levels, buffer, scratch)
}

/// Widens a narrower source integer to `Int32` (spec §4.8 widening
/// rules). No bulk path exists for these widths since the buffer's
/// fast-path contract only recognizes already-`i32`-shaped input (spec
/// §6); every narrower width falls back to the per-value path, matching
/// "Otherwise fall back" in spec §4.8.
fn write_widened_i32<T: Copy>(
	region: &RecordRegion,
	levels: ColumnLevels,
	buffer: &mut dyn ColumnBuffer,
	scratch: &mut ScratchBuffer,
	widen: impl Fn(T) -> i32,
) -> Result<usize, BufferError> {
	let values = gather::<T>(region);
	write_fallback(values.iter().map(|v| ValueData::Int32(widen(*v))), levels, buffer, scratch)
}

fn write_widened_i64<T: Copy>(
	region: &RecordRegion,
	levels: ColumnLevels,
	buffer: &mut dyn ColumnBuffer,
	scratch: &mut ScratchBuffer,
	widen: impl Fn(T) -> i64,
) -> Result<usize, BufferError> {
	let values = gather::<T>(region);
	write_fallback(values.iter().map(|v| ValueData::Int64(widen(*v))), levels, buffer, scratch)
}

/// The generic per-element fallback (spec §4.8 "otherwise"): every
/// element gets its own `Value` carrying the same coalesced-run levels,
/// collected into the reusable [`ScratchBuffer`] instead of a fresh
/// `Vec` (spec §4.9), then flushed through the buffer's mandatory
/// `write_values`.
fn write_fallback(
	data: impl Iterator<Item = ValueData>,
	levels: ColumnLevels,
	buffer: &mut dyn ColumnBuffer,
	scratch: &mut ScratchBuffer,
) -> Result<usize, BufferError> {
	let values = scratch.reset();
	values.extend(data.map(|d| Value::new(levels.repetition_level, levels.definition_level, d)));
	buffer.write_values(values.as_slice())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::test_support::RecordingBuffer;

	fn levels(rep: u8, def: u8) -> ColumnLevels {
		ColumnLevels { column_index: 0, repetition_depth: rep, repetition_level: rep, definition_level: def }
	}

	#[test]
	fn empty_region_emits_one_null_placeholder() {
		let region = RecordRegion::empty(4);
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_leaf(&region, SourceScalar::I32, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values.len(), 1);
		assert!(buffer.values[0].data.is_null());
	}

	#[test]
	fn non_empty_i32_region_falls_back_to_one_value_per_element() {
		let batch = vec![7i32, 8, 9];
		let region = RecordRegion::for_batch(&batch);
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_leaf(&region, SourceScalar::I32, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values.len(), 3);
		assert_eq!(buffer.values[0].data, ValueData::Int32(7));
	}

	#[test]
	fn narrow_int_widens_to_int32() {
		let batch = vec![1i8, -2, 3];
		let region = RecordRegion::for_batch(&batch);
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_leaf(&region, SourceScalar::I8, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values[1].data, ValueData::Int32(-2));
	}

	#[test]
	fn byte_vec_is_written_as_byte_array() {
		let batch = vec![vec![1u8, 2, 3]];
		let region = RecordRegion::for_batch(&batch);
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_leaf(&region, SourceScalar::Bytes, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values.len(), 1);
		assert_eq!(buffer.values[0].data, ValueData::ByteArray(ByteArray::from(vec![1u8, 2, 3])));
	}

	#[repr(C)]
	struct Pair { a: i32, b: i64 }

	#[test]
	fn struct_field_projection_reads_correctly_despite_gaps() {
		let batch = vec![Pair { a: 1, b: 100 }, Pair { a: 2, b: 200 }, Pair { a: 3, b: 300 }];
		let root = RecordRegion::for_batch(&batch);
		let b_field = root.field(std::mem::offset_of!(Pair, b));
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_leaf(&b_field, SourceScalar::I64, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values.len(), 3);
		assert_eq!(buffer.values[2].data, ValueData::Int64(300));
	}

	#[test]
	fn uuid_fixed_bytes_roundtrip_through_fallback() {
		let batch: Vec<[u8; 16]> = vec![[1u8; 16], [2u8; 16]];
		let region = RecordRegion::for_batch(&batch);
		let mut buffer = RecordingBuffer::default();
		let mut scratch = ScratchBuffer::new();
		write_fixed_bytes(&region, 16, levels(0, 0), &mut buffer, &mut scratch).unwrap();
		assert_eq!(buffer.values.len(), 2);
		assert_eq!(buffer.values[1].data, ValueData::FixedLenByteArray(FixedLenByteArray::from(vec![2u8; 16])));
	}
}
