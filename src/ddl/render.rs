//! Statement renderers
//!
//! Pure functions: identical input yields byte-identical output. Names are
//! `SqlIdentifier`s and free text is `SqlText`, so every fragment is already
//! safe to splice.

use chrono::NaiveDate;

use super::column::{ColumnDescriptor, SqlValue};
use super::identifier::{escape_literal, SqlIdentifier, SqlText};

/// Storage format recorded for catalogues loaded from VOTABLE files
pub const CATALOGUE_FORMAT: &str = "votable";

/// Renders the catalogue registration, the entries table, its comments and
/// its indexes.
pub fn create_table(
    schema: &SqlIdentifier,
    target_id: i64,
    target_name: &SqlIdentifier,
    description: &SqlText,
    columns: &[ColumnDescriptor],
    filename: &SqlText,
    generation_date: NaiveDate,
) -> String {
    let mut sql = String::new();

    sql.push_str(&format!(
        "INSERT INTO {schema}.catalogue (level7_collection_id, filename, format, entries_table_name, generation_date) \
         VALUES ({target_id}, {filename}, {format}, {table}, {date});\n",
        schema = schema,
        target_id = target_id,
        filename = filename,
        format = escape_literal(CATALOGUE_FORMAT),
        table = escape_literal(target_name.as_str()),
        date = escape_literal(&generation_date.format("%Y-%m-%d").to_string()),
    ));

    sql.push_str(&format!("CREATE TABLE {}.{} (\n", schema, target_name));
    sql.push_str("    id BIGSERIAL PRIMARY KEY");
    for column in columns {
        sql.push_str(&format!(",\n    {} {}", column.source_name, column.sql_type));
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
    }
    sql.push_str("\n);\n");

    if !description.is_empty() {
        sql.push_str(&format!(
            "COMMENT ON TABLE {}.{} is {};\n",
            schema, target_name, description
        ));
    }
    for column in columns.iter().filter(|c| !c.description.is_empty()) {
        sql.push_str(&format!(
            "COMMENT ON COLUMN {}.{}.{} is {};\n",
            schema, target_name, column.source_name, column.description
        ));
    }

    for column in columns.iter().filter(|c| c.indexed) {
        sql.push_str(&format!(
            "CREATE INDEX {table}_{column}_idx ON {schema}.{table} ({column});\n",
            schema = schema,
            table = target_name,
            column = column.source_name,
        ));
    }

    sql
}

/// Renders one row insert. Missing trailing values render as NULL.
pub fn insert_row(
    schema: &SqlIdentifier,
    target_name: &SqlIdentifier,
    columns: &[ColumnDescriptor],
    values: &[SqlValue],
) -> String {
    let names: Vec<String> = columns.iter().map(|c| c.source_name.to_string()).collect();
    let rendered: Vec<String> = (0..columns.len())
        .map(|i| values.get(i).unwrap_or(&SqlValue::Null).to_string())
        .collect();

    format!(
        "INSERT INTO {}.{} ({}) VALUES ({});",
        schema,
        target_name,
        names.join(", "),
        rendered.join(", ")
    )
}

/// Renders the TAP metadata rows describing a table and its columns.
///
/// The table is registered as `<owner_code>.<target_name>`; `params` become
/// a `name : value | ...` summary.
pub fn register_metadata(
    schema: &SqlIdentifier,
    owner_code: &SqlIdentifier,
    target_name: &SqlIdentifier,
    description: &SqlText,
    columns: &[ColumnDescriptor],
    params: &[(String, String)],
) -> String {
    let tap_name = SqlText::new(format!("{}.{}", owner_code, target_name));
    let params = SqlText::new(
        params
            .iter()
            .map(|(name, value)| format!("{} : {}", name, value))
            .collect::<Vec<_>>()
            .join(" | "),
    );

    let mut sql = format!(
        "INSERT INTO {schema}.tap_tables (schema_name, table_name, table_type, description, utype, params, db_schema_name, db_table_name) \
         VALUES ({owner}, {tap_name}, 'table', {description}, NULL, {params}, {db_schema}, {db_table});\n",
        schema = schema,
        owner = escape_literal(owner_code.as_str()),
        tap_name = tap_name,
        description = nullable_text(description),
        params = nullable_text(&params),
        db_schema = escape_literal(schema.as_str()),
        db_table = escape_literal(target_name.as_str()),
    );

    for (order, column) in columns.iter().enumerate() {
        sql.push_str(&format!(
            "INSERT INTO {schema}.tap_columns (table_name, column_name, description, unit, ucd, utype, datatype, size, principal, indexed, std, db_column_name, column_order) \
             VALUES ({tap_name}, {name}, {description}, {unit}, {ucd}, {utype}, {datatype}, {size}, {principal}, {indexed}, 0, {name}, {order});\n",
            schema = schema,
            tap_name = tap_name,
            name = escape_literal(column.source_name.as_str()),
            description = nullable_text(&column.description),
            unit = nullable_text(&column.unit),
            ucd = nullable_text(&column.ucd),
            utype = nullable_text(&column.utype),
            datatype = escape_literal(column.datatype.as_str()),
            size = column
                .sql_size()
                .map_or_else(|| "NULL".to_string(), |size| size.to_string()),
            principal = u8::from(column.principal),
            indexed = u8::from(column.indexed),
            order = order + 1,
        ));
    }

    sql
}

fn nullable_text(text: &SqlText) -> String {
    if text.is_empty() {
        "NULL".to_string()
    } else {
        text.literal()
    }
}
