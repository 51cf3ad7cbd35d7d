//! Descriptive statistics and per-type summaries.

use super::{Column, ColumnData, MISSING_BOOLEAN, MISSING_CATEGORY};
use crate::table::Table;
use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;

/// Descriptive statistics over the present values of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    /// Sample variance (n - 1); zero for a single value
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Stats {
    fn from_values(name: &str, values: &[f64], missing: usize) -> Self {
        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        let variance = variance(values);

        Self {
            name: name.to_string(),
            count: values.len(),
            missing,
            sum: values.iter().sum(),
            mean: mean(values),
            min,
            max,
            range: min.zip(max).map(|(lo, hi)| hi - lo),
            variance,
            std_dev: variance.map(f64::sqrt),
        }
    }

    /// Fixed-schema `Measure` / `Value` table
    pub fn as_table(&self) -> Result<Table> {
        let rows: [(&str, Option<f64>); 9] = [
            ("Count", Some(self.count as f64)),
            ("Missing", Some(self.missing as f64)),
            ("Sum", Some(self.sum)),
            ("Mean", self.mean),
            ("Min", self.min),
            ("Max", self.max),
            ("Range", self.range),
            ("Variance", self.variance),
            ("Std. Dev", self.std_dev),
        ];

        Table::from_columns(
            format!("{} stats", self.name),
            vec![
                Column::categories("Measure", rows.iter().map(|(m, _)| Some(*m))),
                Column::floats("Value", rows.iter().map(|(_, v)| *v)),
            ],
        )
    }
}

impl Column {
    /// Present values of a numeric column, widened to `f64`
    pub(crate) fn numeric_values(&self) -> Result<Vec<f64>> {
        match self.data() {
            ColumnData::Integer(v) => Ok(v
                .iter()
                .filter(|&&x| x != super::MISSING_INTEGER)
                .map(|&x| x as f64)
                .collect()),
            ColumnData::Float(v) => Ok(v.iter().copied().filter(|x| !x.is_nan()).collect()),
            _ => Err(Error::TypeMismatch(format!(
                "Column '{}' is {}, expected a numeric column",
                self.name(),
                self.column_type()
            ))),
        }
    }

    /// Sum of present values; zero when there are none
    pub fn sum(&self) -> Result<f64> {
        Ok(self.numeric_values()?.iter().sum())
    }

    pub fn mean(&self) -> Result<Option<f64>> {
        Ok(mean(&self.numeric_values()?))
    }

    pub fn min(&self) -> Result<Option<f64>> {
        Ok(self.numeric_values()?.into_iter().reduce(f64::min))
    }

    pub fn max(&self) -> Result<Option<f64>> {
        Ok(self.numeric_values()?.into_iter().reduce(f64::max))
    }

    pub fn stats(&self) -> Result<Stats> {
        let values = self.numeric_values()?;
        Ok(Stats::from_values(self.name(), &values, self.len() - values.len()))
    }

    /// A descriptive table appropriate to the column type
    pub fn summary(&self) -> Result<Table> {
        match self.column_type() {
            ColumnType::Integer | ColumnType::Float => self.stats()?.as_table(),
            ColumnType::Category => self.category_summary(),
            ColumnType::Boolean => self.boolean_summary(),
            ColumnType::LocalDate | ColumnType::LocalTime | ColumnType::LocalDateTime => {
                self.temporal_summary()
            }
        }
    }

    fn category_summary(&self) -> Result<Table> {
        let ColumnData::Category { dictionary, codes } = self.data() else {
            return Err(Error::TypeMismatch(format!("Column '{}' is not a category", self.name())));
        };

        let mut counts = vec![0i64; dictionary.len()];
        for &code in codes.iter().filter(|&&c| c != MISSING_CATEGORY) {
            counts[code as usize] += 1;
        }

        let mut entries: Vec<(&str, i64)> = dictionary
            .values()
            .iter()
            .map(String::as_str)
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Table::from_columns(
            format!("{} summary", self.name()),
            vec![
                Column::categories("Category", entries.iter().map(|(v, _)| Some(*v))),
                Column::integers("Count", entries.iter().map(|(_, c)| Some(*c))),
            ],
        )
    }

    fn boolean_summary(&self) -> Result<Table> {
        let ColumnData::Boolean(values) = self.data() else {
            return Err(Error::TypeMismatch(format!("Column '{}' is not boolean", self.name())));
        };

        let (mut trues, mut falses, mut missing) = (0i64, 0i64, 0i64);
        for &v in values {
            match v {
                MISSING_BOOLEAN => missing += 1,
                0 => falses += 1,
                _ => trues += 1,
            }
        }

        Table::from_columns(
            format!("{} summary", self.name()),
            vec![
                Column::categories("Value", [Some("true"), Some("false"), Some("missing")]),
                Column::integers("Count", [Some(trues), Some(falses), Some(missing)]),
            ],
        )
    }

    fn temporal_summary(&self) -> Result<Table> {
        let present: Vec<Value> = self.values().filter(|v| !v.is_missing()).collect();
        let earliest = present
            .iter()
            .min_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
        let latest = present
            .iter()
            .max_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));

        let count = present.len().to_string();
        let missing = (self.len() - present.len()).to_string();
        let rendered = [
            Some(count),
            Some(missing),
            earliest.map(ToString::to_string),
            latest.map(ToString::to_string),
        ];

        Table::from_columns(
            format!("{} summary", self.name()),
            vec![
                Column::categories(
                    "Measure",
                    [Some("Count"), Some("Missing"), Some("Earliest"), Some("Latest")],
                ),
                Column::categories("Value", rendered),
            ],
        )
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub(crate) fn variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    if values.len() == 1 {
        return Some(0.0);
    }
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(squares / (values.len() - 1) as f64)
}
