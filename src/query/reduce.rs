//! Group-by reductions.

use super::sort::{sort_permutation, SortKey};
use crate::column::{mean, median, variance, Column, ColumnData};
use crate::table::Table;
use crate::types::ColumnType;
use crate::{Error, Result};
use std::fmt;
use tracing::debug;

/// Reduction applied to the present values of each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    /// Number of present values; accepts any column type
    Count,
    Range,
    /// Sample variance (n - 1)
    Variance,
    StdDev,
}

impl Aggregation {
    pub const ALL: [Aggregation; 9] = [
        Aggregation::Sum,
        Aggregation::Mean,
        Aggregation::Median,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Count,
        Aggregation::Range,
        Aggregation::Variance,
        Aggregation::StdDev,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
            Aggregation::Median => "Median",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
            Aggregation::Count => "Count",
            Aggregation::Range => "Range",
            Aggregation::Variance => "Variance",
            Aggregation::StdDev => "Std. Dev",
        }
    }

    pub fn result_type(&self) -> ColumnType {
        match self {
            Aggregation::Count => ColumnType::Integer,
            _ => ColumnType::Float,
        }
    }

    fn accepts(&self, column_type: ColumnType) -> bool {
        *self == Aggregation::Count || column_type.is_numeric()
    }

    /// Reduce a group's present values; `None` when there are none
    fn apply(&self, values: &[f64]) -> Option<f64> {
        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        match self {
            Aggregation::Sum => (!values.is_empty()).then(|| values.iter().sum::<f64>()),
            Aggregation::Mean => mean(values),
            Aggregation::Min => min,
            Aggregation::Max => max,
            Aggregation::Range => min.zip(max).map(|(lo, hi)| hi - lo),
            Aggregation::Count => (!values.is_empty()).then_some(values.len() as f64),
            Aggregation::Variance => variance(values),
            Aggregation::StdDev => variance(values).map(f64::sqrt),
            Aggregation::Median => median(&mut values.to_vec()),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row per distinct value of `group_column`, holding `aggregation` of `value_column`
pub fn reduce(table: &Table, value_column: &str, group_column: &str, aggregation: Aggregation) -> Result<Table> {
    reduce_many(table, value_column, group_column, &[aggregation])
}

/// Like [`reduce`], with one result column per aggregation, in the given order.
///
/// Groups are emitted in ascending order of the group value with the missing
/// group last. A group without present values yields a missing result.
pub fn reduce_many(
    table: &Table,
    value_column: &str,
    group_column: &str,
    aggregations: &[Aggregation],
) -> Result<Table> {
    if aggregations.is_empty() {
        return Err(Error::Config("reduce needs at least one aggregation".to_string()));
    }

    let values = table.column(value_column)?;
    let groups = table.column(group_column)?;
    if let Some(agg) = aggregations.iter().find(|a| !a.accepts(values.column_type())) {
        return Err(Error::TypeMismatch(format!(
            "{} needs a numeric column, '{}' is {}",
            agg,
            value_column,
            values.column_type()
        )));
    }

    let order = sort_permutation(table, &SortKey::ascending(group_column))?;
    let runs = group_runs(groups.data(), &order);

    let mut results: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(runs.len()); aggregations.len()];
    let mut representatives = Vec::with_capacity(runs.len());
    for run in &runs {
        representatives.push(run[0]);

        let present: Vec<usize> = run.iter().copied().filter(|&i| !values.is_missing(i)).collect();
        let numbers: Vec<f64> = if values.column_type().is_numeric() {
            present.iter().filter_map(|&i| values.value_at(i).as_f64()).collect()
        } else {
            // only Count gets here; the values themselves are irrelevant
            vec![0.0; present.len()]
        };

        for (agg, out) in aggregations.iter().zip(results.iter_mut()) {
            out.push(agg.apply(&numbers));
        }
    }

    let mut columns = Vec::with_capacity(aggregations.len() + 1);
    columns.push(groups.take(&representatives));
    for (agg, out) in aggregations.iter().zip(results) {
        let name = format!("{} [{}]", agg, value_column);
        columns.push(match agg.result_type() {
            ColumnType::Integer => Column::integers(name, out.into_iter().map(|v| v.map(|c| c as i64))),
            _ => Column::floats(name, out),
        });
    }

    let label = aggregations
        .iter()
        .map(Aggregation::name)
        .collect::<Vec<_>>()
        .join(", ");
    let reduced = Table::from_columns(format!("{} {} by {}", label, value_column, group_column), columns)?;

    debug!(
        table = %table.name(),
        rows = table.row_count(),
        groups = reduced.row_count(),
        "reduce complete"
    );
    Ok(reduced)
}

/// Split a sorted row order into runs of equal group cells
fn group_runs(data: &ColumnData, order: &[usize]) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &row in order {
        match runs.last_mut() {
            Some(run) if same_cell(data, run[0], row) => run.push(row),
            _ => runs.push(vec![row]),
        }
    }
    runs
}

/// Storage equality. Sentinels compare equal to each other, so missing cells form one run.
fn same_cell(data: &ColumnData, a: usize, b: usize) -> bool {
    match data {
        ColumnData::Integer(v) => v[a] == v[b],
        ColumnData::Float(v) => v[a] == v[b] || (v[a].is_nan() && v[b].is_nan()),
        ColumnData::Boolean(v) => v[a] == v[b],
        ColumnData::Category { codes, .. } => codes[a] == codes[b],
        ColumnData::LocalDate(v) => v[a] == v[b],
        ColumnData::LocalTime(v) => v[a] == v[b],
        ColumnData::LocalDateTime(v) => v[a] == v[b],
    }
}
