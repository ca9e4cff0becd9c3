//! Integration tests for the redaction engines.
//!
//! Exercises the public engine across all three formats, including the
//! selectivity and idempotence properties.

use std::sync::Arc;

use arrow::array::{Array, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use bytes::Bytes;
use obf_redact::{
    EncodingSource, FieldMatcher, Format, RedactionEngine, RedactionError, MASK_TOKEN,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use proptest::prelude::*;
use serde_json::Value;

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

#[test]
fn utf16_csv_with_bom_is_detected_and_written_as_utf8() {
    let engine = RedactionEngine::new();
    let input = utf16le_with_bom("id,name,email\n1,Zoë,z@x.io\n");
    let out = engine
        .redact_fields(Format::Tabular, &input, &["email"])
        .expect("redact");
    assert_eq!(
        String::from_utf8(out.output).unwrap(),
        "id,name,email\n1,Zoë,***\n"
    );
    let encoding = out.encoding.expect("text formats carry an encoding report");
    assert_eq!(encoding.source, EncodingSource::ByteOrderMark);
}

#[test]
fn short_utf8_csv_keeps_untargeted_cells() {
    let out = RedactionEngine::new()
        .redact_fields(Format::Tabular, "id,name,city\n1,Ann,Zürich\n".as_bytes(), &["name"])
        .expect("redact");
    assert_eq!(String::from_utf8(out.output).unwrap(), "id,name,city\n1,***,Zürich\n");
    let encoding = out.encoding.expect("encoding report");
    assert_eq!(encoding.encoding, "UTF-8");
    assert!(!encoding.is_low_confidence());
}

#[test]
fn json_numbers_pass_through_untouched() {
    let input = r#"{"id": 123456789012345678901234567890, "name": "Ann", "amount": 0.1000000000000000055511151231257827}"#;
    let out = RedactionEngine::new()
        .redact_fields(Format::Record, input.as_bytes(), &["name"])
        .expect("redact");
    assert_eq!(
        String::from_utf8(out.output).unwrap(),
        "{\n  \"id\": 123456789012345678901234567890,\n  \"name\": \"***\",\n  \"amount\": 0.1000000000000000055511151231257827\n}"
    );
}

#[test]
fn json_payload_in_csv_engine_is_rejected() {
    let engine = RedactionEngine::new();
    let err = engine
        .redact_fields(Format::Tabular, br#"[{"name": "Ann"}]"#, &["name"])
        .unwrap_err();
    assert!(matches!(err, RedactionError::FormatMismatch(_)));
}

#[test]
fn parquet_round_trip_keeps_rows_and_untargeted_values() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("customer", DataType::Utf8, false),
        Field::new("balance", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["Ann", "Bo", "Cy", "Di"])),
            Arc::new(Float64Array::from(vec![Some(1.5), None, Some(-2.0), Some(0.0)])),
        ],
    )
    .unwrap();
    let mut input = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut input, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let out = RedactionEngine::new()
        .redact_fields(Format::Columnar, &input, &["Customer"])
        .expect("redact");
    assert!(out.encoding.is_none());

    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(out.output))
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 4);

    let balance = batches[0]
        .column(1)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(balance, batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap());
    let customer = batches[0]
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert!(customer.iter().all(|v| v == Some(MASK_TOKEN)));
}

#[test]
fn empty_parquet_keeps_schema() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, true),
    ]));
    let mut input = Vec::new();
    let writer = ArrowWriter::try_new(&mut input, schema, None).unwrap();
    writer.close().unwrap();

    let out = RedactionEngine::new()
        .redact_fields(Format::Columnar, &input, &["email"])
        .expect("redact");
    assert_eq!(out.report.records_scanned, 0);

    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(out.output)).unwrap();
    assert_eq!(builder.schema().fields().len(), 2);
}

#[test]
fn non_string_field_entries_are_rejected_before_parsing() {
    let values = vec![Value::from("name"), Value::from(3)];
    assert!(matches!(
        FieldMatcher::from_values(&values),
        Err(RedactionError::InvalidFieldType(_))
    ));
}

// ============================================================================
// Properties
// ============================================================================

fn csv_cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9@. äöüßéñøÅЖ中]{0,8}"
}

/// JSON number literals well outside `i64`/`f64` precision.
fn json_number() -> impl Strategy<Value = String> {
    "-?[1-9][0-9]{0,40}(\\.[0-9]{1,34})?"
}

fn csv_table() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    (2usize..6).prop_flat_map(|cols| {
        let headers = Just((0..cols).map(|i| format!("col{i}")).collect::<Vec<_>>());
        let rows = prop::collection::vec(prop::collection::vec(csv_cell(), cols), 1..8);
        (headers, rows)
    })
}

fn to_csv(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

fn parse_csv(text: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(text);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

proptest! {
    #[test]
    fn csv_untargeted_columns_never_change(
        (headers, rows) in csv_table(),
        target in 0usize..2,
    ) {
        let input = to_csv(&headers, &rows);
        let field = headers[target].to_uppercase();
        let out = RedactionEngine::new()
            .redact_fields(Format::Tabular, input.as_bytes(), &[field.as_str()])
            .unwrap();

        let redacted = parse_csv(&out.output);
        prop_assert_eq!(redacted.len(), rows.len());
        for (before, after) in rows.iter().zip(&redacted) {
            for (idx, (b, a)) in before.iter().zip(after).enumerate() {
                if idx == target {
                    prop_assert_eq!(a.as_str(), MASK_TOKEN);
                } else {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn csv_redaction_is_idempotent((headers, rows) in csv_table()) {
        let input = to_csv(&headers, &rows);
        let engine = RedactionEngine::new();
        let fields = [headers[0].as_str(), headers[1].as_str()];
        let first = engine.redact_fields(Format::Tabular, input.as_bytes(), &fields).unwrap();
        let second = engine.redact_fields(Format::Tabular, &first.output, &fields).unwrap();
        prop_assert_eq!(&first.output, &second.output);
        prop_assert_eq!(first.report.cells_masked, second.report.cells_masked);
    }

    #[test]
    fn json_untargeted_keys_never_change(
        records in prop::collection::vec(
            (csv_cell(), csv_cell(), json_number()),
            1..6,
        ),
    ) {
        let objects: Vec<String> = records
            .iter()
            .map(|(name, city, n)| {
                format!(
                    r#"{{"Name": {}, "city": {}, "n": {}}}"#,
                    serde_json::to_string(name).unwrap(),
                    serde_json::to_string(city).unwrap(),
                    n
                )
            })
            .collect();
        let input = format!("[{}]", objects.join(", "));
        let doc: Vec<Value> = serde_json::from_str(&input).unwrap();
        let out = RedactionEngine::new()
            .redact_fields(Format::Record, input.as_bytes(), &["name"])
            .unwrap();
        let text = String::from_utf8(out.output).unwrap();
        let after: Vec<Value> = serde_json::from_str(&text).unwrap();

        prop_assert_eq!(after.len(), doc.len());
        for ((b, a), (_, _, n)) in doc.iter().zip(&after).zip(&records) {
            prop_assert_eq!(&a["Name"], &Value::from(MASK_TOKEN));
            prop_assert_eq!(&a["city"], &b["city"]);
            prop_assert_eq!(&a["n"], &b["n"]);
            prop_assert!(text.contains(n.as_str()));
        }
    }
}
