//! Offline slug and URL commands

use crate::OutputFormat;
use anyhow::{bail, Result};
use farmacia_core::slug::{self, EntityKind};
use owo_colors::OwoColorize;
use serde_json::json;

/// Print the sanitized slug of `text`
pub fn run_slug(text: &str, format: OutputFormat) -> Result<()> {
    let result = slug::sanitize(text);

    match format {
        OutputFormat::Json => println!("{}", json!({ "input": text, "slug": result })),
        OutputFormat::Text if result.is_empty() => {
            println!("{}", "(empty slug)".dimmed());
        }
        OutputFormat::Text => println!("{result}"),
    }
    Ok(())
}

/// Print the canonical URL of an entity
pub fn run_url(kind: &str, id: &str, name: Option<&str>, format: OutputFormat) -> Result<()> {
    let kind: EntityKind = kind.parse()?;
    if !slug::is_numeric_id(id) {
        bail!("Entity id must be numeric, got '{id}'");
    }

    let url = slug::build_url(kind, id, name);

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "kind": kind, "id": id, "url": url, "legacy": slug::legacy_url(kind, id) })
        ),
        OutputFormat::Text => println!("{url}"),
    }
    Ok(())
}

/// Print the id carried by a storefront URL, path or slug
pub fn run_extract(url: &str, format: OutputFormat) -> Result<()> {
    let entity = slug::parse_entity_url(url);
    let id = slug::extract_id(url);

    match format {
        OutputFormat::Json => println!("{}", json!({ "input": url, "id": id, "entity": entity })),
        OutputFormat::Text => match entity {
            Some(entity) => {
                let form = if entity.legacy { " (legacy URL)" } else { "" };
                println!("{} {}{}", entity.kind.cyan(), entity.id.bold(), form.dimmed());
            }
            None => println!("{id}"),
        },
    }
    Ok(())
}
