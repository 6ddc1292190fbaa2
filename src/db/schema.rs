// Sample schema and row loading

use color_eyre::{eyre::bail, Result};
use libsql::params::Params;
use serde_json::Value as JsonValue;

use crate::models::{SampleSource, TableDef};

/// `CREATE TABLE` for one declared table. Names, types and constraint clauses
/// are author input and go in verbatim.
pub fn create_table_sql(table: &TableDef) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut def = format!("{} {}", column.name, column.sql_type);
            if let Some(constraints) = column.constraints.as_deref().map(str::trim) {
                if !constraints.is_empty() {
                    def.push(' ');
                    def.push_str(constraints);
                }
            }
            def
        })
        .collect();
    format!("CREATE TABLE {} ({})", table.name, columns.join(", "))
}

/// Parameterized `INSERT` for the given subset of a table's columns.
pub fn insert_sql(table: &str, columns: &[&str]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

pub fn to_sql_value(value: &JsonValue) -> libsql::Value {
    match value {
        JsonValue::Null => libsql::Value::Null,
        JsonValue::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => libsql::Value::Integer(i),
            None => libsql::Value::Real(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => libsql::Value::Text(s.clone()),
        other => libsql::Value::Text(other.to_string()),
    }
}

/// Create every declared table and insert its sample rows. Returns the number
/// of rows inserted. Nothing is committed unless everything succeeds.
pub async fn populate(conn: &libsql::Connection, source: &SampleSource) -> Result<usize> {
    let tx = conn.transaction().await?;
    let mut inserted = 0;

    for table in &source.schema.tables {
        tx.execute(&create_table_sql(table), ()).await?;

        let Some(rows) = source.sample_data.get(&table.name) else {
            continue;
        };
        let Some(rows) = rows.as_array() else {
            bail!("sample rows of table '{}' are not a list", table.name);
        };

        for (i, row) in rows.iter().enumerate() {
            let Some(row) = row.as_object() else {
                bail!("row {i} of table '{}' is not an object", table.name);
            };
            if let Some(unknown) = row
                .keys()
                .find(|key| !table.column_names().any(|c| c == key.as_str()))
            {
                bail!(
                    "row {i} of table '{}' has no declared column '{unknown}'",
                    table.name
                );
            }

            let columns: Vec<&str> = table
                .column_names()
                .filter(|c| row.contains_key(*c))
                .collect();
            let values = columns.iter().map(|c| to_sql_value(&row[*c])).collect();
            tx.execute(&insert_sql(&table.name, &columns), Params::Positional(values))
                .await?;
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}
