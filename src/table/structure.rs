use super::Table;
use crate::column::Column;
use crate::Result;

impl Table {
    /// One row per column: `Index`, `Column Name`, `Column Type`
    pub fn structure(&self) -> Result<Table> {
        let index = Column::integers("Index", (0..self.column_count() as i64).map(Some));
        let names = Column::categories("Column Name", self.columns().map(|c| Some(c.name())));
        let types = Column::categories(
            "Column Type",
            self.columns().map(|c| Some(c.column_type().name())),
        );

        Table::from_columns(format!("Structure of {}", self.name()), vec![index, names, types])
    }
}
