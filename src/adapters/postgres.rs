use crate::config::PostgresSettings;
use crate::domain::table::{CellValue, Column, ColumnType, CsvTable};
use crate::domain::TableSink;
use crate::utils::error::Result;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};

/// Postgres allows at most 65535 bind parameters per statement.
const MAX_BIND_PARAMS: usize = 65_535;
const MAX_ROWS_PER_INSERT: usize = 1_000;

/// Replace-table loads into PostgreSQL. Opens a fresh connection per load.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    settings: PostgresSettings,
}

impl PostgresSink {
    pub fn new(settings: PostgresSettings) -> Self {
        Self { settings }
    }

    async fn connect(&self) -> Result<PgConnection> {
        let url = self.settings.database_url()?;
        tracing::debug!("Connecting to postgres {}", self.settings.redacted_target());
        Ok(PgConnection::connect(&url).await?)
    }
}

impl TableSink for PostgresSink {
    async fn replace_table(&self, table_name: &str, table: &CsvTable) -> Result<u64> {
        let mut conn = self.connect().await?;

        // DDL 在 Postgres 可以進 transaction，失敗時舊表會保留
        let mut tx = conn.begin().await?;

        let drop_sql = format!("DROP TABLE IF EXISTS {}", quote_ident(table_name));
        sqlx::query(&drop_sql).execute(&mut *tx).await?;

        let create_sql = create_table_sql(table_name, &table.columns);
        tracing::debug!("{}", create_sql);
        sqlx::query(&create_sql).execute(&mut *tx).await?;

        let mut written = 0u64;
        for chunk in table.rows.chunks(rows_per_batch(table.column_count())) {
            let mut builder = insert_builder(table_name, &table.columns, chunk);
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        conn.close().await?;

        tracing::debug!("Committed {} rows into {}", written, table_name);
        Ok(written)
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn create_table_sql(table_name: &str, columns: &[Column]) -> String {
    let defs = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(table_name), defs)
}

pub fn rows_per_batch(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / column_count.max(1)).clamp(1, MAX_ROWS_PER_INSERT)
}

fn insert_builder<'args>(
    table_name: &str,
    columns: &[Column],
    rows: &[Vec<CellValue>],
) -> QueryBuilder<'args, Postgres> {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        quote_ident(table_name),
        column_list
    ));

    builder.push_values(rows, |mut b, row| {
        for (cell, column) in row.iter().zip(columns) {
            match (cell, column.column_type) {
                (CellValue::Integer(v), _) => b.push_bind(*v),
                (CellValue::Float(v), _) => b.push_bind(*v),
                (CellValue::Boolean(v), _) => b.push_bind(*v),
                (CellValue::Text(v), _) => b.push_bind(v.clone()),
                (CellValue::Null, ColumnType::BigInt) => b.push_bind(None::<i64>),
                (CellValue::Null, ColumnType::Double) => b.push_bind(None::<f64>),
                (CellValue::Null, ColumnType::Boolean) => b.push_bind(None::<bool>),
                (CellValue::Null, ColumnType::Text) => b.push_bind(None::<String>),
            };
        }
    });

    builder
}
