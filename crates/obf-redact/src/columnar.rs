//! Parquet redaction through Arrow record batches.
//!
//! Matched columns are replaced by non-null `Utf8` columns holding the mask
//! token for every row. Other columns pass through untouched. Dataframe index
//! columns (`__index_level_N__`) are dropped, and so is the `pandas` schema
//! metadata entry, which would otherwise describe the original column types.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::engine::{Redacted, Redactor};
use crate::error::{RedactionError, Result};
use crate::format::Format;
use crate::matcher::{FieldMatcher, MatchAccumulator};
use obf_common::MASK_TOKEN;

const PANDAS_METADATA_KEY: &str = "pandas";

/// Redacts whole columns of a Parquet file.
#[derive(Debug, Clone)]
pub struct ColumnarRedactor {
    compression: Compression,
}

impl Default for ColumnarRedactor {
    fn default() -> Self {
        ColumnarRedactor {
            compression: Compression::SNAPPY,
        }
    }
}

impl ColumnarRedactor {
    /// Use a different compression codec for the output file.
    pub fn with_compression(compression: Compression) -> Self {
        ColumnarRedactor { compression }
    }
}

impl Redactor for ColumnarRedactor {
    fn format(&self) -> Format {
        Format::Columnar
    }

    fn redact(&self, payload: &[u8], matcher: &FieldMatcher) -> Result<Redacted> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(payload))
            .map_err(|e| RedactionError::InvalidPayload(format!("not a readable Parquet file: {e}")))?;
        let input_schema = builder.schema().clone();
        let reader = builder.build()?;
        let batches = reader
            .collect::<std::result::Result<Vec<RecordBatch>, _>>()
            .map_err(|e| RedactionError::InvalidPayload(format!("corrupt Parquet data: {e}")))?;

        // Column indices that survive into the output.
        let kept: Vec<usize> = input_schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !is_index_column(f.name()))
            .map(|(idx, _)| idx)
            .collect();

        let matched = matcher.match_names(
            kept.iter()
                .map(|&idx| input_schema.field(idx).name().as_str()),
        );
        let mut acc = MatchAccumulator::new(matcher);
        acc.absorb(&matched);
        acc.ensure_found()?;

        let masked_flags: Vec<bool> = kept
            .iter()
            .map(|&idx| matched.is_targeted(input_schema.field(idx).name()))
            .collect();
        let output_schema = output_schema(&input_schema, &kept, &masked_flags);

        let mut rows = 0usize;
        let mut masked = 0usize;
        let mut out_batches = Vec::with_capacity(batches.len());
        for batch in &batches {
            let num_rows = batch.num_rows();
            rows += num_rows;
            let columns: Vec<ArrayRef> = kept
                .iter()
                .zip(&masked_flags)
                .map(|(&idx, &mask)| {
                    if mask {
                        masked += num_rows;
                        Arc::new(StringArray::from(vec![MASK_TOKEN; num_rows])) as ArrayRef
                    } else {
                        batch.column(idx).clone()
                    }
                })
                .collect();
            out_batches.push(RecordBatch::try_new(output_schema.clone(), columns)?);
        }

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();
        let mut output = Vec::with_capacity(payload.len());
        let mut writer = ArrowWriter::try_new(&mut output, output_schema, Some(props))?;
        for batch in &out_batches {
            writer.write(batch)?;
        }
        writer.close()?;

        Ok(Redacted {
            output,
            report: acc.finish(rows, masked),
        })
    }
}

fn is_index_column(name: &str) -> bool {
    name.strip_prefix("__index_level_")
        .and_then(|rest| rest.strip_suffix("__"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn output_schema(input: &Schema, kept: &[usize], masked: &[bool]) -> SchemaRef {
    let fields: Vec<Field> = kept
        .iter()
        .zip(masked)
        .map(|(&idx, &mask)| {
            let field = input.field(idx);
            if mask {
                Field::new(field.name(), DataType::Utf8, false)
            } else {
                field.clone()
            }
        })
        .collect();

    let mut metadata = input.metadata().clone();
    metadata.remove(PANDAS_METADATA_KEY);
    Arc::new(Schema::new_with_metadata(fields, metadata))
}
