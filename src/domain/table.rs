use crate::utils::error::Result;
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
        }
    }

    /// Narrowest type every non-empty cell fits. A column with no values is TEXT.
    pub fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let values: Vec<&str> = cells.filter(|c| !c.is_empty()).collect();
        if values.is_empty() {
            return ColumnType::Text;
        }

        if values.iter().all(|v| v.parse::<i64>().is_ok()) {
            ColumnType::BigInt
        } else if values
            .iter()
            .all(|v| v.parse::<f64>().map(f64::is_finite).unwrap_or(false))
        {
            ColumnType::Double
        } else if values.iter().all(|v| parse_bool(v).is_some()) {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl CellValue {
    fn parse(raw: &str, column_type: ColumnType) -> Self {
        if raw.is_empty() {
            return CellValue::Null;
        }
        // infer() 已保證每個非空值都能解析
        match column_type {
            ColumnType::BigInt => raw.parse().map(CellValue::Integer).unwrap_or(CellValue::Null),
            ColumnType::Double => raw.parse().map(CellValue::Float).unwrap_or(CellValue::Null),
            ColumnType::Boolean => parse_bool(raw)
                .map(CellValue::Boolean)
                .unwrap_or(CellValue::Null),
            ColumnType::Text => CellValue::Text(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// A cleaned CSV held in memory with its inferred schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CsvTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let names = column_names(csv_reader.headers()?);
        let records = csv_reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name,
                column_type: ColumnType::infer(
                    records.iter().map(|r| r.get(idx).unwrap_or("")),
                ),
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        CellValue::parse(record.get(idx).unwrap_or(""), col.column_type)
                    })
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Blank headers become `Unnamed: <idx>` and repeats get a `.<n>` suffix.
fn column_names(headers: &csv::StringRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let base = match raw.trim() {
                "" => format!("Unnamed: {}", idx),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_types() {
        assert_eq!(ColumnType::infer(["1", "-2", ""].into_iter()), ColumnType::BigInt);
        assert_eq!(ColumnType::infer(["1", "2.5"].into_iter()), ColumnType::Double);
        assert_eq!(ColumnType::infer(["True", "false"].into_iter()), ColumnType::Boolean);
        assert_eq!(ColumnType::infer(["1", "abc"].into_iter()), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", ""].into_iter()), ColumnType::Text);
        assert_eq!(ColumnType::infer(["inf"].into_iter()), ColumnType::Text);
    }

    #[test]
    fn test_from_reader_parses_typed_rows() {
        let csv = "title,score,published\nA,1,true\nB,,false\n";
        let table = CsvTable::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns[0].column_type, ColumnType::Text);
        assert_eq!(table.columns[1].column_type, ColumnType::BigInt);
        assert_eq!(table.columns[2].column_type, ColumnType::Boolean);
        assert_eq!(
            table.rows[1],
            vec![
                CellValue::Text("B".to_string()),
                CellValue::Null,
                CellValue::Boolean(false)
            ]
        );
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let table = CsvTable::from_reader("title,url\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let table = CsvTable::from_reader(",title,title\n0,a,b\n".as_bytes()).unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Unnamed: 0", "title", "title.1"]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        assert!(CsvTable::from_reader("a,b\n1,2,3\n".as_bytes()).is_err());
    }
}
