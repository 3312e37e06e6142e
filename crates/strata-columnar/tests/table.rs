use pretty_assertions::assert_eq;
use strata_columnar::{
    Array, ChunkedArray, ColumnSelector, DataType, Error, ErrorKind, Field, MergeSource,
    RowSelector, Schema, Table, Value,
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

fn wide() -> Table {
    Table::from_arrays(
        ["a", "b", "c", "d", "e"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, Array::from(vec![i as i64; 2]))),
    )
    .expect("wide table")
}

fn row(count: Option<u8>, visible: Option<bool>) -> Vec<Value> {
    vec![
        count.map(Value::UInt8).unwrap_or(Value::Null),
        visible.map(Value::Boolean).unwrap_or(Value::Null),
    ]
}

fn counts(table: &Table) -> Vec<Option<i64>> {
    table.columns()[0]
        .data()
        .values()
        .map(|v| v.as_i64())
        .collect()
}

#[test]
fn fixture_has_expected_shape() {
    let table = count_visible();
    assert_eq!(table.row_count(), 8);
    assert_eq!(table.column_names(), vec!["count", "visible"]);
    assert_eq!(
        table.schema(),
        &Schema::new(vec![
            Field::new("count", DataType::UInt8).with_nullable(false),
            Field::new("visible", DataType::Boolean),
        ])
    );
    assert_eq!(table.columns()[0].n_chunks(), 4);
    assert_eq!(table.columns()[1].n_chunks(), 5);
    assert_eq!(table.columns()[1].data().null_count(), 3);
}

#[test]
fn construction_rejects_mismatched_lengths() {
    let err = Table::from_arrays([
        ("a", Array::from(vec![1i64, 2])),
        ("b", Array::from(vec![1i64])),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LengthMismatch);
}

#[test]
fn slice_by_mask_skips_null_entries() -> TestResult {
    let table = count_visible();
    let mask = Array::from(vec![
        None,
        Some(true),
        Some(true),
        Some(false),
        Some(true),
        Some(false),
        Some(true),
        Some(true),
    ]);
    let sliced = table.slice([mask])?;
    assert_eq!(sliced.row_count(), 5);
    assert_eq!(
        counts(&sliced),
        vec![Some(2), Some(4), Some(16), Some(64), Some(128)]
    );
    Ok(())
}

#[test]
fn slice_by_single_index() -> TestResult {
    let table = count_visible();
    assert_eq!(table.slice([2i64])?.to_rows(), vec![row(Some(4), None)]);
    assert_eq!(table.slice([-1i64])?.to_rows(), vec![row(Some(128), None)]);
    assert_eq!(table.slice([-8i64])?.to_rows(), vec![row(Some(1), Some(true))]);

    let err = table.slice([8i64]).unwrap_err();
    assert!(matches!(err, Error::Index { index: 8, len: 8 }));
    assert_eq!(table.slice([-9i64]).unwrap_err().kind(), ErrorKind::Index);
    Ok(())
}

#[test]
fn slice_by_ranges() -> TestResult {
    let table = count_visible();
    let expected = vec![
        row(Some(4), None),
        row(Some(8), Some(true)),
        row(Some(16), Some(true)),
    ];
    assert_eq!(table.slice([2i64..=4])?.to_rows(), expected);
    assert_eq!(table.slice([2i64..4])?.to_rows(), expected[..2].to_vec());

    assert_eq!(
        counts(&table.slice([-4i64..=-2])?),
        vec![Some(16), Some(32), Some(64)]
    );
    assert_eq!(counts(&table.slice([-4i64..-2])?), vec![Some(16), Some(32)]);
    assert_eq!(table.slice([5i64..2])?.row_count(), 0);
    Ok(())
}

#[test]
fn slice_by_start_and_length() -> TestResult {
    let table = count_visible();
    assert_eq!(counts(&table.slice([(0i64, 2usize)])?), vec![Some(1), Some(2)]);
    assert_eq!(counts(&table.slice([(-4i64, 2usize)])?), vec![Some(16), Some(32)]);
    assert_eq!(
        counts(&table.slice([(6i64, 10usize)])?),
        vec![Some(64), Some(128)]
    );
    Ok(())
}

#[test]
fn slice_with_several_selectors_concatenates_in_order() -> TestResult {
    let table = count_visible();
    let sliced = table.slice([RowSelector::from(0i64), RowSelector::from(4i64..7)])?;
    assert_eq!(
        counts(&sliced),
        vec![Some(1), Some(16), Some(32), Some(64)]
    );
    // Chunk provenance survives: [1] | [16] | [32, 64]
    assert_eq!(sliced.columns()[0].n_chunks(), 3);
    assert_eq!(sliced.pack()?.columns()[0].n_chunks(), 1);

    let repeated = table.slice([RowSelector::from(-1i64), RowSelector::from(-1i64)])?;
    assert_eq!(counts(&repeated), vec![Some(128), Some(128)]);
    Ok(())
}

#[test]
fn unbounded_inclusive_ranges_select_everything() -> TestResult {
    let table = count_visible();
    let all_rows = table.slice([0i64..=i64::MAX])?;
    assert_eq!(all_rows, table);
    assert_eq!(table.slice([-3i64..=i64::MAX])?.row_count(), 3);

    let all_columns = wide().select_columns([0i64..=i64::MAX])?;
    assert_eq!(all_columns.column_names(), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(all_columns.row_count(), 2);
    Ok(())
}

#[test]
fn slice_requires_a_selector() {
    let table = count_visible();
    let err = table.slice(Vec::<RowSelector>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn slice_leaves_the_source_untouched() -> TestResult {
    let table = count_visible();
    let before = table.to_rows();
    let _ = table.slice([1i64..3])?;
    assert_eq!(table.to_rows(), before);
    assert_eq!(table.columns()[0].n_chunks(), 4);
    Ok(())
}

#[test]
fn column_lookup_by_name_and_position() -> TestResult {
    let table = count_visible();
    assert_eq!(table.column("count")?.name(), "count");
    assert_eq!(table.column(1i64)?.name(), "visible");
    assert_eq!(table.column(-2i64)?.name(), "count");
    assert_eq!(table.column("missing").unwrap_err().kind(), ErrorKind::Key);
    assert_eq!(table.column(2i64).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(table.column(-3i64).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(
        table.column_by_name("visible").map(|c| c.data_type()),
        Some(DataType::Boolean)
    );
    assert!(table.column_by_name("nope").is_none());
    Ok(())
}

#[test]
fn merge_adds_replaces_and_removes_from_a_list() -> TestResult {
    let table = count_visible();

    let removed = table.merge(vec![("visible", None::<Array>)])?;
    assert_eq!(removed.column_names(), vec!["count"]);
    assert_eq!(removed.columns()[0], table.columns()[0]);

    let labels: Vec<&str> = vec!["a", "b", "c", "d", "e", "f", "g", "h"];
    let added = table.merge(vec![("label", Some(Array::from(labels)))])?;
    assert_eq!(added.column_names(), vec!["count", "visible", "label"]);
    assert_eq!(added.value_at(7, 2)?.as_str(), Some("h"));

    let replaced = table.merge(vec![("count", Some(Array::from(vec![0i64; 8])))])?;
    assert_eq!(replaced.column_names(), vec!["count", "visible"]);
    assert_eq!(replaced.columns()[0].data_type(), DataType::Int64);
    assert_eq!(replaced.value_at(3, 0)?, Value::Int64(0));

    let ignored = table.merge(vec![("unknown", None::<Array>)])?;
    assert_eq!(ignored, table);
    Ok(())
}

#[test]
fn merge_touches_only_the_first_column_with_a_name() -> TestResult {
    let table = Table::from_arrays([
        ("a", Array::from(vec![1i64, 2])),
        ("b", Array::from(vec![3i64, 4])),
        ("a", Array::from(vec![5i64, 6])),
    ])?;

    let removed = table.merge(vec![("a", None::<Array>)])?;
    assert_eq!(removed.column_names(), vec!["b", "a"]);
    assert_eq!(removed.value_at(0, 1)?, Value::Int64(5));

    let replaced = table.merge(vec![("a", Some(Array::from(vec![0i64, 0])))])?;
    assert_eq!(replaced.column_names(), vec!["a", "b", "a"]);
    assert_eq!(replaced.value_at(0, 0)?, Value::Int64(0));
    assert_eq!(replaced.value_at(0, 2)?, Value::Int64(5));
    Ok(())
}

#[test]
fn merge_applies_the_last_entry_for_a_name() -> TestResult {
    let table = Table::from_arrays([("x", Array::from(vec![1i64, 2]))])?;

    let set_then_removed = table.merge(
        MergeSource::new()
            .set("x", Array::from(vec![7i64, 7]))
            .remove("x"),
    )?;
    assert_eq!(set_then_removed.column_count(), 0);
    assert_eq!(set_then_removed.row_count(), 2);

    let never_added = table.merge(
        MergeSource::new()
            .set("y", Array::from(vec![7i64, 7]))
            .remove("y"),
    )?;
    assert_eq!(never_added.column_names(), vec!["x"]);

    let removed_then_set = table.merge(
        MergeSource::new()
            .remove("x")
            .set("x", Array::from(vec![9i64, 9])),
    )?;
    assert_eq!(removed_then_set.column_names(), vec!["x"]);
    assert_eq!(removed_then_set.value_at(1, 0)?, Value::Int64(9));

    let twice = table.merge(vec![
        ("y", Some(Array::from(vec![1i64, 1]))),
        ("y", Some(Array::from(vec![2i64, 2]))),
    ])?;
    assert_eq!(twice.column_names(), vec!["x", "y"]);
    assert_eq!(twice.value_at(0, 1)?, Value::Int64(2));
    Ok(())
}

#[test]
fn merge_from_a_table_and_a_builder() -> TestResult {
    let table = count_visible();
    let other = Table::from_arrays([
        ("visible", Array::from(vec![false; 8])),
        ("extra", Array::from(vec![1.5f64; 8])),
    ])?;
    let merged = table.merge(&other)?;
    assert_eq!(merged.column_names(), vec!["count", "visible", "extra"]);
    assert_eq!(merged.columns()[1].data().null_count(), 0);

    let built = table.merge(
        MergeSource::new()
            .remove("count")
            .set("flag", Array::from(vec![true; 8])),
    )?;
    assert_eq!(built.column_names(), vec!["visible", "flag"]);

    let err = table
        .merge(MergeSource::new().set("short", Array::from(vec![1i64])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    Ok(())
}

#[test]
fn remove_column_by_name_and_position() -> TestResult {
    let table = count_visible();
    assert_eq!(table.remove_column("visible")?.column_names(), vec!["count"]);
    assert_eq!(table.remove_column(1i64)?.column_names(), vec!["count"]);

    let last_removed = table.remove_column(-1i64)?;
    assert_eq!(last_removed.column_names(), vec!["count"]);
    assert_eq!(last_removed.columns()[0], table.columns()[0]);
    assert_eq!(last_removed.row_count(), 8);

    assert_eq!(table.remove_column("nope").unwrap_err().kind(), ErrorKind::Key);
    assert_eq!(table.remove_column(-3i64).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(table.remove_column(2i64).unwrap_err().kind(), ErrorKind::Index);
    Ok(())
}

#[test]
fn select_columns_by_name_range_and_index() -> TestResult {
    let table = wide();
    assert_eq!(
        table.select_columns(["e", "a"])?.column_names(),
        vec!["e", "a"]
    );
    assert_eq!(
        table.select_columns([2i64..4])?.column_names(),
        vec!["c", "d"]
    );
    assert_eq!(
        table.select_columns([0i64, -1, 2])?.column_names(),
        vec!["a", "e", "c"]
    );
    assert_eq!(
        table
            .select_columns([
                ColumnSelector::from("b"),
                ColumnSelector::from(-2i64),
                ColumnSelector::from(0i64..=1),
                ColumnSelector::from("b"),
            ])?
            .column_names(),
        vec!["b", "d", "a", "b", "b"]
    );
    assert_eq!(
        table.select_columns(["zz"]).unwrap_err().kind(),
        ErrorKind::Key
    );
    Ok(())
}

#[test]
fn select_columns_with_a_predicate() -> TestResult {
    let table = wide();
    let odd = table.select_columns_where(Vec::<ColumnSelector>::new(), |_, i| i % 2 == 1)?;
    assert_eq!(odd.column_names(), vec!["b", "d"]);

    let by_value = table.select_columns_where(Vec::<ColumnSelector>::new(), |c, _| {
        c.value_at(0).ok().and_then(|v| v.as_i64()).unwrap_or(0) >= 3
    })?;
    assert_eq!(by_value.column_names(), vec!["d", "e"]);

    // Selectors choose candidates first; the predicate sees candidate positions.
    let filtered = table.select_columns_where(
        [
            ColumnSelector::from("e"),
            ColumnSelector::from("a"),
            ColumnSelector::from(1i64),
        ],
        |c, i| i != 1 && c.name() != "zz",
    )?;
    assert_eq!(filtered.column_names(), vec!["e", "b"]);
    assert_eq!(filtered.row_count(), 2);

    let none = table.select_columns_where(Vec::<ColumnSelector>::new(), |_, _| false)?;
    assert_eq!(none.column_count(), 0);
    assert_eq!(none.row_count(), 2);
    Ok(())
}

#[test]
fn pack_merges_chunks_without_changing_values() -> TestResult {
    let table = count_visible();
    let packed = table.pack()?;
    let chunks: Vec<usize> = packed.columns().iter().map(|c| c.n_chunks()).collect();
    assert_eq!(chunks, vec![1, 1]);
    assert_eq!(packed, table);
    assert_eq!(packed.to_rows(), table.to_rows());
    Ok(())
}

#[test]
fn vertical_concat_requires_matching_schemas() -> TestResult {
    let table = count_visible();
    let doubled = table.vertical_concat(&table)?;
    assert_eq!(doubled.row_count(), 16);
    assert_eq!(doubled.columns()[0].n_chunks(), 8);

    let other = table.remove_column("visible")?;
    assert_eq!(
        table.vertical_concat(&other).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    Ok(())
}

#[test]
fn date_values_expose_calendar_dates() -> TestResult {
    let table = Table::from_arrays([("day", Array::date32(vec![Some(17406), None]))])?;
    let day = table.value_at(0, 0)?;
    assert_eq!(day.to_string(), "2017-08-28");
    let date = day.to_date().transpose()?;
    assert_eq!(
        date.map(|d| d.to_string()),
        Some("2017-08-28".to_owned())
    );
    assert_eq!(table.value_at(1, 0)?, Value::Null);
    Ok(())
}
