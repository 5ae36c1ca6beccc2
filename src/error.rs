use std::fmt::{self, Display};

/// Plan-time failure: the record shape given to the planner is not
/// representable in the supported type taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
	UnsupportedShape { path: String, reason: String },
	SchemaColumnMissing { path: String },
}

impl Display for PlanError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PlanError::UnsupportedShape { path, reason } =>
				write!(f, "cannot build a writer plan for `{}`: {}", path, reason),
			PlanError::SchemaColumnMissing { path } =>
				write!(f, "schema has no column at path `{}`", path),
		}
	}
}

impl std::error::Error for PlanError {}

/// Runtime failure surfaced by a [`crate::buffer::ColumnBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferError {
	pub column_index: i16,
	pub message: String,
}

impl BufferError {
	pub fn new(column_index: i16, message: impl Into<String>) -> Self {
		BufferError { column_index, message: message.into() }
	}
}

impl Display for BufferError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "column[{}]: {}", self.column_index, self.message)
	}
}

impl std::error::Error for BufferError {}

/// Top-level error of the shredding core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShredError {
	Plan(PlanError),
	Buffer(BufferError),
}

impl Display for ShredError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ShredError::Plan(e) => Display::fmt(e, f),
			ShredError::Buffer(e) => Display::fmt(e, f),
		}
	}
}

impl std::error::Error for ShredError {}

impl From<PlanError> for ShredError {
	fn from(e: PlanError) -> Self { ShredError::Plan(e) }
}

impl From<BufferError> for ShredError {
	fn from(e: BufferError) -> Self { ShredError::Buffer(e) }
}
