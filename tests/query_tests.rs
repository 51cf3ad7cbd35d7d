mod common;

use common::tornadoes;
use lightning_table::{
    column, init_logging, Aggregation, Column, ColumnType, CsvIngester, Error, SortKey, Table, Value,
};
use tracing::Level;

fn scores() -> Table {
    Table::from_columns(
        "scores",
        vec![
            Column::categories("name", vec![Some("a"), Some("b"), Some("c")]),
            Column::integers("score", vec![Some(5), Some(-2), Some(5)]),
        ],
    )
    .unwrap()
}

fn names(table: &Table) -> Vec<Value> {
    table.column("name").unwrap().values().collect()
}

#[test]
fn test_filter_positive_scores() {
    let positive = scores().select_where(&column("score").is_greater_than(0)).unwrap();
    assert_eq!(names(&positive), vec![Value::from("a"), Value::from("c")]);
}

#[test]
fn test_sort_descending_is_stable() {
    let sorted = scores().sort_descending_on("score").unwrap();
    assert_eq!(
        names(&sorted),
        vec![Value::from("a"), Value::from("c"), Value::from("b")]
    );
}

#[test]
fn test_reduce_sum_by_name() {
    let reduced = scores().reduce("score", "name", Aggregation::Sum).unwrap();

    assert_eq!(reduced.shape(), (3, 2));
    assert_eq!(reduced.name(), "Sum score by name");
    let sums: Vec<Value> = reduced.column("Sum [score]").unwrap().values().collect();
    assert_eq!(sums, vec![Value::Float(5.0), Value::Float(-2.0), Value::Float(5.0)]);
}

#[test]
fn test_empty_integer_field_sums_to_missing() {
    let table = CsvIngester::new(&[ColumnType::Category, ColumnType::Integer])
        .read("gaps", "name,score\na,\nb,3\n".as_bytes())
        .unwrap();
    assert!(table.column("score").unwrap().is_missing(0));

    let reduced = table.reduce("score", "name", Aggregation::Sum).unwrap();
    assert_eq!(
        reduced.row(0).unwrap(),
        vec![Value::from("a"), Value::Missing]
    );
    assert_eq!(reduced.row(1).unwrap(), vec![Value::from("b"), Value::Float(3.0)]);
}

#[test]
fn test_derivations_leave_source_untouched() {
    init_logging(Level::DEBUG, false);

    let table = tornadoes();
    let snapshot = table.clone();

    let _ = table.select_where(&column("Fatalities").is_greater_than(10)).unwrap();
    let _ = table.sort_ascending_on("State").unwrap();
    let _ = table.reduce("Injuries", "State", Aggregation::Mean).unwrap();
    let _ = table.select_columns(&["State", "Width"]).unwrap();

    assert_eq!(table, snapshot);
}

#[test]
fn test_multi_key_sort() {
    let key = SortKey::ascending("State").then_descending("Fatalities");
    let sorted = tornadoes().sort_on(&key).unwrap();

    let states: Vec<String> = sorted
        .column("State")
        .unwrap()
        .values()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(states, vec!["IL", "MI", "MO", "OH", "OK", "TX", "TX", "TX"]);

    let fatalities: Vec<Value> = sorted.column("Fatalities").unwrap().values().skip(5).collect();
    assert_eq!(
        fatalities,
        vec![Value::Integer(114), Value::Integer(20), Value::Integer(2)]
    );
}

#[test]
fn test_missing_sorts_last_both_ways() {
    let table = tornadoes();
    for sorted in [
        table.sort_ascending_on("Width").unwrap(),
        table.sort_descending_on("Width").unwrap(),
    ] {
        let width = sorted.column("Width").unwrap();
        assert!(width.is_missing(width.len() - 1));
        assert_eq!(width.missing_count(), 1);
    }
}

#[test]
fn test_compound_predicate() {
    let table = tornadoes();
    let texas_or_violent = column("State")
        .is_equal_to("TX")
        .and(column("Scale").is_greater_than_or_equal_to(5))
        .or(column("Injuries").is_missing());

    let selected = table.select_where(&texas_or_violent).unwrap();
    assert_eq!(selected.row_count(), 2);

    let inverse = table.select_where(&!texas_or_violent).unwrap();
    assert_eq!(selected.row_count() + inverse.row_count(), table.row_count());
}

#[test]
fn test_summarize_fatalities_by_scale() {
    let summary = tornadoes()
        .summarize(
            "Fatalities",
            "Scale",
            &[Aggregation::Count, Aggregation::Sum, Aggregation::Max],
        )
        .unwrap();

    assert_eq!(
        summary.column_names(),
        vec!["Scale", "Count [Fatalities]", "Sum [Fatalities]", "Max [Fatalities]"]
    );
    // scales 1, 2, 3, 4, 5
    assert_eq!(summary.row_count(), 5);
    assert_eq!(
        summary.row(4).unwrap(),
        vec![Value::Integer(5), Value::Integer(2), Value::Float(230.0), Value::Float(116.0)]
    );
}

#[test]
fn test_first_and_last() {
    let table = tornadoes();
    assert_eq!(table.first(3).row_count(), 3);
    assert_eq!(table.last(2).row(0).unwrap()[2], Value::from("TX"));
    assert_eq!(table.first(100), table);
}

#[test]
fn test_column_stats() {
    let stats = tornadoes().column("Fatalities").unwrap().stats().unwrap();
    assert_eq!(stats.count, 8);
    assert_eq!(stats.sum, 257.0);
    assert_eq!(stats.max, Some(116.0));

    let table = stats.as_table().unwrap();
    assert_eq!(table.name(), "Fatalities stats");
}

#[test]
fn test_structural_errors_leave_table_intact() {
    let mut table = tornadoes();
    assert!(matches!(
        table.remove_columns(&["Width", "Nope"]),
        Err(Error::ColumnNotFound(_))
    ));
    assert!(matches!(
        table.add_column(0, Column::integers("Short", vec![Some(1)])),
        Err(Error::LengthMismatch { .. })
    ));
    assert_eq!(table, tornadoes());

    table.remove_columns(&["Width", "Time"]).unwrap();
    assert_eq!(table.column_count(), 5);
}
