use pretty_assertions::assert_eq;
use strata_columnar::{
    read_table, write_table, Array, ChunkedArray, ColumnSelector, CsvOptions, DataType,
    ErrorKind, FileFormat, LoadOptions, SaveOptions, StreamTableWriter, Table, TimeUnit, Value,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn count_visible() -> Table {
    let count = ChunkedArray::from_chunks(vec![
        Array::from(vec![1u8, 2]),
        Array::from(vec![4u8, 8, 16]),
        Array::from(vec![32u8, 64]),
        Array::from(vec![128u8]),
    ])
    .expect("count chunks");
    let visible = ChunkedArray::from_chunks(vec![
        Array::from(vec![Some(true), Some(false), None]),
        Array::from(vec![true]),
        Array::from(vec![true, false]),
        Array::from(vec![None::<bool>]),
        Array::from(vec![None::<bool>]),
    ])
    .expect("visible chunks");
    Table::from_arrays([("count", count), ("visible", visible)]).expect("fixture table")
}

fn mixed_types() -> Table {
    Table::from_arrays([
        ("name", Array::from(vec![Some("alpha"), None, Some("gamma, delta")])),
        ("score", Array::from(vec![Some(1.25f64), Some(-2.0), None])),
        ("small", Array::from(vec![-1i8, 0, 1])),
        ("big", Array::from(vec![Some(u64::MAX), None, Some(0)])),
        ("day", Array::date32(vec![Some(17406), None, Some(0)])),
        (
            "at",
            Array::timestamp(
                TimeUnit::Millisecond,
                vec![Some(1_503_878_400_123), None, Some(-1)],
            ),
        ),
    ])
    .expect("mixed table")
}

#[test]
fn default_format_round_trips_losslessly() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("table.arrow");
    let table = count_visible();

    table.save_default(&path)?;
    assert_eq!(&std::fs::read(&path)?[..6], b"ARROW1");

    let loaded = Table::load_default(&path)?;
    assert_eq!(loaded, table);
    assert_eq!(loaded.schema(), table.schema());
    assert_eq!(loaded.columns()[0].data_type(), DataType::UInt8);
    Ok(())
}

#[test]
fn binary_formats_round_trip_every_type() -> TestResult {
    let dir = tempfile::tempdir()?;
    let table = mixed_types();
    for format in [FileFormat::Batch, FileFormat::Stream, FileFormat::Parquet] {
        let path = dir.path().join(format!("{format:?}.bin"));
        table.save(&path, &SaveOptions::with_format(format))?;

        let explicit = Table::load(&path, &LoadOptions::with_format(format))?;
        assert_eq!(explicit, table, "{format:?} explicit");

        let sniffed = Table::load_default(&path)?;
        assert_eq!(sniffed, table, "{format:?} sniffed");
    }
    Ok(())
}

#[test]
fn batch_and_stream_keep_chunk_layout() -> TestResult {
    let table = count_visible();
    for format in [FileFormat::Batch, FileFormat::Stream] {
        let bytes = write_table(Vec::new(), &table, &SaveOptions::with_format(format))?;
        let loaded = read_table(bytes, &LoadOptions::default())?;
        // Union of the [2, 5, 7] and [3, 4, 6, 7] chunk boundaries.
        assert_eq!(loaded.columns()[0].n_chunks(), 7, "{format:?}");
        assert_eq!(loaded, table);
    }
    Ok(())
}

#[test]
fn csv_round_trip_compares_inferred_values() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("table.csv");
    let table = count_visible();

    table.save(&path, &SaveOptions::with_format(FileFormat::Csv))?;
    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with("count,visible\n1,true\n2,false\n4,\n"));

    let loaded = Table::load_default(&path)?;
    assert_eq!(loaded.column_names(), vec!["count", "visible"]);
    assert_eq!(loaded.columns()[0].data_type(), DataType::Int64);
    assert_eq!(loaded.columns()[1].data_type(), DataType::Boolean);
    assert_eq!(loaded.row_count(), table.row_count());
    for (original, reread) in table.to_rows().iter().zip(loaded.to_rows()) {
        assert_eq!(original[0].as_i64(), reread[0].as_i64());
        assert_eq!(original[1], reread[1]);
    }
    Ok(())
}

#[test]
fn csv_with_header_infers_column_types() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("with_header.csv");
    std::fs::write(&path, "name,score\nalice,10\nbob,29\nchris,-1\n")?;

    let table = Table::load(&path, &LoadOptions::with_format(FileFormat::Csv))?;
    assert_eq!(table.column_names(), vec!["name", "score"]);
    assert_eq!(table.columns()[0].data_type(), DataType::Utf8);
    assert_eq!(table.columns()[1].data_type(), DataType::Int64);
    assert_eq!(
        table.to_rows(),
        vec![
            vec![Value::from("alice"), Value::Int64(10)],
            vec![Value::from("bob"), Value::Int64(29)],
            vec![Value::from("chris"), Value::Int64(-1)],
        ]
    );
    Ok(())
}

#[test]
fn csv_without_header_synthesizes_names() -> TestResult {
    let options = LoadOptions {
        format: Some(FileFormat::Csv),
        csv: CsvOptions {
            has_header: false,
            delimiter: b';',
            ..CsvOptions::default()
        },
    };
    let table = read_table(b"1;x\n2;y\n".to_vec(), &options)?;
    assert_eq!(table.column_names(), vec!["f0", "f1"]);
    assert_eq!(table.value_at(1, 0)?, Value::Int64(2));
    Ok(())
}

#[test]
fn stream_writer_appends_tables_into_one_load() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("appended.stream");
    let table = count_visible();

    let file = std::fs::File::create(&path)?;
    let mut writer = StreamTableWriter::try_new(file, table.schema())?;
    writer.write(&table)?;
    writer.write(&table.slice([0i64..2])?)?;
    writer.finish()?;

    let loaded = Table::load_default(&path)?;
    assert_eq!(loaded.row_count(), 10);
    assert_eq!(loaded, table.vertical_concat(&table.slice([0i64..2])?)?);
    Ok(())
}

#[test]
fn corrupt_binary_input_fails_without_a_table() -> TestResult {
    let table = count_visible();
    let mut bytes = write_table(Vec::new(), &table, &SaveOptions::default())?;
    bytes.truncate(bytes.len() / 2);
    let err = read_table(bytes, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);

    let err = Table::load_default("/definitely/not/here.arrow").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    Ok(())
}

#[test]
fn empty_tables_round_trip() -> TestResult {
    let table = count_visible().slice([0i64..0])?;
    assert_eq!(table.row_count(), 0);
    for format in [FileFormat::Batch, FileFormat::Stream, FileFormat::Parquet] {
        let bytes = write_table(Vec::new(), &table, &SaveOptions::with_format(format))?;
        let loaded = read_table(bytes, &LoadOptions::default())?;
        assert_eq!(loaded.schema(), table.schema());
        assert_eq!(loaded.row_count(), 0);
    }

    let no_columns =
        count_visible().select_columns_where(Vec::<ColumnSelector>::new(), |_, _| false)?;
    assert_eq!(no_columns.column_count(), 0);
    assert_eq!(no_columns.row_count(), 8);
    for format in [FileFormat::Batch, FileFormat::Stream] {
        let bytes = write_table(Vec::new(), &no_columns, &SaveOptions::with_format(format))?;
        let loaded = read_table(bytes, &LoadOptions::with_format(format))?;
        assert_eq!(loaded.column_count(), 0, "{format:?}");
        assert_eq!(loaded.row_count(), 8, "{format:?}");
        assert_eq!(loaded, no_columns);
    }
    Ok(())
}
