// relaudit/src/commands/catalog.rs
//
// USE CASE: Show what the catalog reader sees (tables, keys, edges).

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use relaudit_core::RelauditError;
use relaudit_core::application::CatalogReader;

use super::project;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let opened = project::open(&project_dir).await?;
    let options = opened.config.catalog;

    println!(
        "📚 Catalog of schema '{}' ({})",
        opened.schema,
        opened.connector.engine_name()
    );
    let request = opened
        .config
        .to_request(&opened.schema)
        .map_err(RelauditError::Config)?;
    let snapshot = CatalogReader::read(opened.connector.as_ref(), &opened.schema, &options)
        .await?
        .with_primary_keys(&request.primary_keys)
        .map_err(RelauditError::Config)?;

    let mut tables = Table::new();
    tables.load_preset(UTF8_FULL);
    tables.set_header(vec!["Table", "Columns", "Primary key"]);
    for t in &snapshot.tables {
        let columns: Vec<String> = t
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect();
        let key = if t.primary_key.is_empty() {
            "-".to_string()
        } else {
            t.primary_key.join(", ")
        };
        tables.add_row(vec![t.table.to_string(), columns.join("\n"), key]);
    }
    println!("{tables}");

    let mut edges = snapshot.edges.clone();
    if options.infer_edges {
        edges.extend(snapshot.infer_edges(&[]));
    }

    if edges.is_empty() {
        println!("   No foreign-key edges found.");
        return Ok(());
    }
    let mut edge_table = Table::new();
    edge_table.load_preset(UTF8_FULL);
    edge_table.set_header(vec!["Edge", "Origin"]);
    for edge in &edges {
        edge_table.add_row(vec![edge.to_string(), format!("{:?}", edge.origin).to_lowercase()]);
    }
    println!("{edge_table}");
    Ok(())
}
