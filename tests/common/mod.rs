#![allow(dead_code)]

use lightning_table::{ColumnType, CsvIngester, Table};
use std::fs;
use std::path::{Path, PathBuf};

pub const TORNADO_CSV: &str = "\
Date,Time,State,Scale,Injuries,Fatalities,Width
1950-01-03,11:00:00,MO,3,3,0,150.0
1950-01-03,11:55:00,IL,3,0,0,200.0
1950-01-03,16:00:00,OH,1,1,0,10.0
1951-05-01,14:30:00,TX,2,12,2,
1951-05-01,15:10:00,OK,4,NA,5,880.5
1952-03-21,,TX,4,165,20,1000.0
1953-05-11,16:10:00,TX,5,597,114,583.0
1953-06-08,19:30:00,MI,5,844,116,833.0
";

pub fn tornado_types() -> Vec<ColumnType> {
    vec![
        ColumnType::LocalDate,
        ColumnType::LocalTime,
        ColumnType::Category,
        ColumnType::Integer,
        ColumnType::Integer,
        ColumnType::Integer,
        ColumnType::Float,
    ]
}

pub fn tornadoes() -> Table {
    CsvIngester::new(&tornado_types())
        .read("tornadoes", TORNADO_CSV.as_bytes())
        .expect("sample CSV should ingest")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write test file");
    path
}
