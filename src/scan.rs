//! L2 null-run scanners (spec §4.2): given a packed `&[T]` slice of a
//! scalar field tagged `optional` under the null-by-zero policy, find
//! the next position whose value is (or isn't) the type's zero
//! sentinel, so [`crate::composite::Optional`] can batch a maximal run
//! of same-nullness values into one buffer call instead of branching
//! value by value.
//!
//! Every scanner is monomorphized per primitive type rather than going
//! through a `PartialEq` trait object, so the compiler can see straight
//! through to a tight loop (or, for the single-byte-comparable types,
//! straight through to `memchr`).

/// A scalar type whose "null" is the plain zero value rather than a
/// separate `Option` tag. Implemented only for the primitive kinds the
/// null-by-zero policy actually applies to.
pub trait ZeroSentinel: Copy + PartialEq {
	const ZERO: Self;

	fn is_null(&self) -> bool {
		*self == Self::ZERO
	}
}

macro_rules! impl_zero_sentinel {
	($($t:ty),*) => {
		$(impl ZeroSentinel for $t {
			const ZERO: Self = 0 as $t;
		})*
	};
}

impl_zero_sentinel!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ZeroSentinel for bool {
	const ZERO: Self = false;
}

/// Finds the index of the first null (zero-sentinel) value in
/// `values[from..]`, or `values.len()` if the run to the end is all
/// non-null.
pub fn first_null_index<T: ZeroSentinel>(values: &[T], from: usize) -> usize {
	values[from..].iter().position(|v| v.is_null()).map(|i| i + from).unwrap_or(values.len())
}

/// Finds the index of the first non-null value in `values[from..]`, or
/// `values.len()` if the run to the end is all null.
pub fn first_non_null_index<T: ZeroSentinel>(values: &[T], from: usize) -> usize {
	values[from..].iter().position(|v| !v.is_null()).map(|i| i + from).unwrap_or(values.len())
}

/// Byte-sweep fast path for the single-byte-comparable types (`bool`,
/// `i8`, `u8`): `memchr` finds the zero byte directly instead of going
/// through the generic iterator loop.
pub fn first_null_index_bytes(values: &[u8], from: usize) -> usize {
	memchr::memchr(0, &values[from..]).map(|i| i + from).unwrap_or(values.len())
}

/// `memchr` has no "find anything but this byte" primitive, so the
/// not-zero sweep stays a plain loop; it's still branch-predictor
/// friendly since real optional-int columns are mostly non-null.
pub fn first_non_null_index_bytes(values: &[u8], from: usize) -> usize {
	values[from..].iter().position(|&b| b != 0).map(|i| i + from).unwrap_or(values.len())
}

/// Routes a single-byte-comparable `T` (`bool`, `i8`, `u8`) through the
/// `memchr` byte sweep instead of the generic per-element loop (spec
/// §4.2's "byte-sweep fast path ... for single-byte comparable types").
/// Safe because every such `T` is exactly one byte wide and its zero
/// bit pattern is the type's zero sentinel, so reading the slice as
/// `&[u8]` changes neither the length nor which positions are "null".
pub fn first_null_index_byte_sized<T: ZeroSentinel>(values: &[T], from: usize) -> usize {
	debug_assert_eq!(std::mem::size_of::<T>(), 1);
	let bytes = unsafe { std::slice::from_raw_parts(values.as_ptr() as *const u8, values.len()) };
	first_null_index_bytes(bytes, from)
}

/// Symmetric with [`first_null_index_byte_sized`].
pub fn first_non_null_index_byte_sized<T: ZeroSentinel>(values: &[T], from: usize) -> usize {
	debug_assert_eq!(std::mem::size_of::<T>(), 1);
	let bytes = unsafe { std::slice::from_raw_parts(values.as_ptr() as *const u8, values.len()) };
	first_non_null_index_bytes(bytes, from)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_first_null_in_generic_slice() {
		let values = [1i32, 2, 0, 4];
		assert_eq!(first_null_index(&values, 0), 2);
		assert_eq!(first_null_index(&values, 3), 4);
	}

	#[test]
	fn finds_first_non_null_in_generic_slice() {
		let values = [0i32, 0, 5, 0];
		assert_eq!(first_non_null_index(&values, 0), 2);
		assert_eq!(first_non_null_index(&values, 3), 4);
	}

	#[test]
	fn byte_sweep_matches_generic_behavior() {
		let values: Vec<u8> = vec![9, 8, 0, 7];
		assert_eq!(first_null_index_bytes(&values, 0), 2);
		assert_eq!(first_null_index(&values, 0), 2);
	}

	#[test]
	fn all_non_null_run_reports_full_length() {
		let values = [1i32, 2, 3];
		assert_eq!(first_null_index(&values, 0), 3);
	}

	#[test]
	fn byte_sized_fast_path_matches_generic_for_i8_and_bool() {
		let i8s = [1i8, 0, -3, 0];
		assert_eq!(first_null_index_byte_sized(&i8s, 0), 1);
		assert_eq!(first_non_null_index_byte_sized(&i8s, 2), 2);

		let bools = [true, false, true];
		assert_eq!(first_null_index_byte_sized(&bools, 0), 1);
		assert_eq!(first_non_null_index_byte_sized(&bools, 1), 2);
	}
}
