//! Schema-directed row shredding core for a columnar Parquet writer.
//!
//! A caller builds a [`plan::WriterPlan`] once per (record type, schema)
//! pair via [`plan::build_plan`], then drives it against batches of
//! records through [`writer::RowWriter`]. Wire encoding, file layout,
//! schema parsing and file I/O are out of scope; a caller supplies its
//! own [`buffer::ColumnBufferSet`] and [`schema::SchemaLookup`].

pub mod buffer;
pub mod composite;
pub mod error;
pub mod leaves;
pub mod levels;
pub mod plan;
pub mod region;
pub mod scan;
pub mod schema;
pub mod shape;
pub mod value;
pub mod writer;

pub use buffer::{ColumnBuffer, ColumnBufferSet};
pub use error::{BufferError, PlanError, ShredError};
pub use plan::{build_plan, WriterPlan};
pub use region::RecordRegion;
pub use schema::{ColumnPath, ResolvedColumn, SchemaLookup};
pub use shape::{FieldShape, FieldTag, RecordShape};
pub use value::{SourceScalar, Value, ValueData};
pub use writer::{RowWriter, ScratchBuffer, WriterStats};
