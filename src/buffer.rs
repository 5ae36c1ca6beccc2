//! The external column-buffer interface (spec §6): the one trait a
//! caller must implement to receive shredded values. Grounded on the
//! teacher's `ColumnAppenderBase`/`ColumnAppender` pair, collapsed into
//! a single object-safe trait since this crate has no per-record-type
//! generic parameter to thread through (a `Value` already carries its
//! own tag).

use parquet::data_type::{ByteArray, FixedLenByteArray, Int96};

use crate::error::BufferError;
use crate::value::Value;

/// Sink for one physical column's worth of shredded output.
///
/// `write_values` is the only method an implementor must provide and is
/// always correct to call; the `as_*_bulk` methods are an opt-in fast
/// path (spec §6) a buffer can implement when it can accept a packed
/// `&[T]` plus a side `&[u8]` null mask more cheaply than being handed
/// one [`Value`] at a time. The plan walker (see [`crate::composite`])
/// always tries the matching bulk method first and falls back to
/// `write_values` when it returns `None`.
pub trait ColumnBuffer {
	/// Appends `values` in order, returning the number of bytes a
	/// caller-defined memory-accounting scheme should attribute to this
	/// call (spec §5); buffers that don't track memory may always
	/// return 0.
	fn write_values(&mut self, values: &[Value]) -> Result<usize, BufferError>;

	fn as_bool_bulk(&mut self) -> Option<&mut dyn BoolBulkAppender> {
		None
	}
	fn as_i32_bulk(&mut self) -> Option<&mut dyn Int32BulkAppender> {
		None
	}
	fn as_i64_bulk(&mut self) -> Option<&mut dyn Int64BulkAppender> {
		None
	}
	fn as_i96_bulk(&mut self) -> Option<&mut dyn Int96BulkAppender> {
		None
	}
	fn as_float_bulk(&mut self) -> Option<&mut dyn FloatBulkAppender> {
		None
	}
	fn as_double_bulk(&mut self) -> Option<&mut dyn DoubleBulkAppender> {
		None
	}
	fn as_byte_array_bulk(&mut self) -> Option<&mut dyn ByteArrayBulkAppender> {
		None
	}
	fn as_fixed_len_byte_array_bulk(&mut self) -> Option<&mut dyn FixedLenByteArrayBulkAppender> {
		None
	}
}

/// A bulk call always names the repetition level for the whole run
/// explicitly (it is constant across a coalesced run by construction,
/// see [`crate::composite::write_optional`]) and the definition level
/// for the non-null values in the run; null entries within `null_mask`
/// get the buffer's statically known "absent" definition level instead.
///
/// `null_mask[i]` true means `values[i]` is logically absent; bulk
/// appenders still receive a full-length `values` slice with arbitrary
/// (ignorable) content at null positions so the caller never needs to
/// compact the buffer before forwarding it.
macro_rules! bulk_appender_trait {
	($name:ident, $value_ty:ty) => {
		pub trait $name {
			fn write_bulk(
				&mut self,
				values: &[$value_ty],
				null_mask: Option<&[bool]>,
				repetition_level: u8,
				definition_level: u8,
				null_definition_level: u8,
			) -> Result<usize, BufferError>;
		}
	};
}

bulk_appender_trait!(BoolBulkAppender, bool);
bulk_appender_trait!(Int32BulkAppender, i32);
bulk_appender_trait!(Int64BulkAppender, i64);
bulk_appender_trait!(Int96BulkAppender, Int96);
bulk_appender_trait!(FloatBulkAppender, f32);
bulk_appender_trait!(DoubleBulkAppender, f64);
bulk_appender_trait!(ByteArrayBulkAppender, ByteArray);
bulk_appender_trait!(FixedLenByteArrayBulkAppender, FixedLenByteArray);

/// The set of physical column buffers a [`crate::plan::WriterPlan`]
/// writes into, indexed by the column index the plan resolved at
/// build time. Ownership stays with the caller (spec §5); this crate
/// only ever borrows through `column_mut`.
pub trait ColumnBufferSet {
	fn column_mut(&mut self, column_index: i16) -> Result<&mut dyn ColumnBuffer, BufferError>;
}

/// The straightforward case: one boxed buffer per physical column,
/// indexed directly. Sufficient whenever the caller's column indices
/// are dense and start at 0, which is the usual case for a Parquet
/// schema flattened by `parquet::schema::types::SchemaDescriptor`.
pub struct IndexedColumnBuffers {
	columns: Vec<Box<dyn ColumnBuffer>>,
}

impl IndexedColumnBuffers {
	pub fn new(columns: Vec<Box<dyn ColumnBuffer>>) -> Self {
		IndexedColumnBuffers { columns }
	}
}

impl ColumnBufferSet for IndexedColumnBuffers {
	fn column_mut(&mut self, column_index: i16) -> Result<&mut dyn ColumnBuffer, BufferError> {
		self.columns
			.get_mut(column_index as usize)
			.map(|b| b.as_mut())
			.ok_or_else(|| BufferError::new(column_index, "no column buffer registered at this index"))
	}
}
