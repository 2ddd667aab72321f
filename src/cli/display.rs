use colored::*;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use raidionics_catalog::catalog::CatalogRefresh;
use raidionics_catalog::cloud::CloudModelEntry;
use raidionics_catalog::inventory::InventorySnapshot;
use raidionics_catalog::manifest::{DetailField, ModelDescriptor};

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| {
            Cell::new(title)
                .fg(comfy_table::Color::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(header(titles))
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Displays local models with their catalog position.
pub fn display_models_table(models: &[&ModelDescriptor]) {
    if models.is_empty() {
        println!("{}", "No models found in catalog".yellow());
        return;
    }

    let mut table = new_table(&["#", "Name", "Task", "Organ", "Modality", "Image digest"]);
    for (i, model) in models.iter().enumerate() {
        let task = model
            .task
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let digest = model.image.digest.as_deref().map(short_digest).unwrap_or("-");
        table.add_row(vec![
            Cell::new(i + 1).fg(comfy_table::Color::White).set_alignment(CellAlignment::Center),
            Cell::new(&model.name).fg(comfy_table::Color::Green),
            Cell::new(task).fg(comfy_table::Color::Magenta).set_alignment(CellAlignment::Center),
            Cell::new(model.organ.as_deref().unwrap_or("-")).fg(comfy_table::Color::Blue),
            Cell::new(model.modality.as_deref().unwrap_or("-")).fg(comfy_table::Color::Cyan),
            Cell::new(digest).fg(comfy_table::Color::DarkGrey),
        ]);
    }

    println!("\n{}", table);
    println!("{}", format!("Total models: {}", models.len()).bright_green());
}

/// Reports manifest failures and inventory problems of a refresh.
pub fn display_refresh_warnings(refresh: &CatalogRefresh) {
    if let Some(reason) = &refresh.inventory.unavailable {
        println!("{} {}", "Image inventory unavailable:".yellow(), reason);
    }
    for excluded in &refresh.excluded {
        println!(
            "{} {} (image not cached locally)",
            "Excluded:".yellow(),
            excluded.name
        );
    }
    for path in &refresh.deleted {
        println!("{} {}", "Deleted manifest:".red(), path.display());
    }
    for (path, error) in &refresh.delete_failures {
        println!("{} {}: {}", "Could not delete manifest:".red(), path.display(), error);
    }
    if refresh.failures.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("{} manifest(s) could not be loaded:", refresh.failures.len()).red()
    );
    for failure in &refresh.failures {
        println!("  {} {}", failure.path.display().to_string().bold(), failure.fault);
    }
}

pub fn display_details(name: &str, fields: &[(DetailField, String)]) {
    println!("\n{}", format!("Exhaustive description for {}", name).bright_cyan());
    println!("{}", "=".repeat(50).bright_black());
    for (field, value) in fields {
        println!("{}: {}", field.key().green(), value.trim_end());
    }
    println!();
}

pub fn display_inventory(snapshot: &InventorySnapshot) {
    if let Some(reason) = &snapshot.unavailable {
        println!("{} {}", "Image inventory unavailable:".red(), reason);
        return;
    }
    if snapshot.records.is_empty() {
        println!("{}", "No images with digests cached locally".yellow());
        return;
    }

    let mut table = new_table(&["Repository", "Digest"]);
    for record in &snapshot.records {
        table.add_row(vec![
            Cell::new(&record.repository).fg(comfy_table::Color::Green),
            Cell::new(&record.digest).fg(comfy_table::Color::DarkGrey),
        ]);
    }
    println!("\n{}", table);
}

pub fn display_cloud_table(entries: &[&CloudModelEntry]) {
    if entries.is_empty() {
        println!("{}", "No cloud models available for download".yellow());
        return;
    }

    let mut table = new_table(&["#", "Name", "Source"]);
    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).fg(comfy_table::Color::White).set_alignment(CellAlignment::Center),
            Cell::new(&entry.name).fg(comfy_table::Color::Green),
            Cell::new(&entry.source).fg(comfy_table::Color::DarkGrey),
        ]);
    }
    println!("\n{}", table);
}

fn short_digest(digest: &str) -> &str {
    let encoded = digest.split_once(':').map_or(digest, |(_, encoded)| encoded);
    encoded
        .char_indices()
        .nth(12)
        .map_or(encoded, |(end, _)| &encoded[..end])
}
