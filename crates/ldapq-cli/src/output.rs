//! Output formatting utilities.

use std::fmt::Write as _;

use colored::Colorize;
use ldapq_core::{Entry, LDAP_ATTRIBUTE_LIST_OUTPUT};
use serde::Serialize;
use serde_json::{json, Value};
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One `(name, value)` pair of an entry, for table display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AttributeRow {
    /// Entry position in the result.
    #[tabled(rename = "#")]
    pub entry: usize,
    /// Attribute name.
    #[tabled(rename = "Attribute")]
    pub name: String,
    /// Attribute value.
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Flattens entries into table rows, numbering entries from 1.
#[must_use]
pub fn attribute_rows(entries: &[Entry]) -> Vec<AttributeRow> {
    entries
        .iter()
        .enumerate()
        .flat_map(|(index, entry)| {
            entry.values().iter().map(move |v| AttributeRow {
                entry: index + 1,
                name: v.name.clone(),
                value: v.value.clone(),
            })
        })
        .collect()
}

/// Renders a search result in the given format.
///
/// JSON and YAML publish the entries under `ldapAttributeList`; quiet
/// output is the entry count alone.
pub fn render_entries(entries: &[Entry], format: OutputFormat) -> crate::CliResult<String> {
    let document = || json!({ LDAP_ATTRIBUTE_LIST_OUTPUT: entries });

    Ok(match format {
        OutputFormat::Table => Table::new(attribute_rows(entries))
            .with(Style::rounded())
            .to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&document())?,
        OutputFormat::Yaml => {
            let mut out = String::new();
            write_yaml_value(&mut out, &document(), 0);
            out
        }
        OutputFormat::Quiet => entries.len().to_string(),
    })
}

/// Prints a search result in the given format.
pub fn print_entries(entries: &[Entry], format: OutputFormat) -> crate::CliResult<()> {
    if entries.is_empty() && format == OutputFormat::Table {
        info("No entries found.");
        return Ok(());
    }

    let rendered = render_entries(entries, format)?;
    println!("{}", rendered.trim_end());
    if format == OutputFormat::Table {
        info(&format!("{} entries", entries.len()));
    }
    Ok(())
}

/// Prints a value as YAML-like output.
pub fn print_yaml(value: &Value) {
    let mut out = String::new();
    write_yaml_value(&mut out, value, 0);
    print!("{out}");
}

fn write_yaml_value(out: &mut String, value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_object() || item.is_array() {
                    let _ = writeln!(out, "{prefix}-");
                    write_yaml_value(out, item, indent + 1);
                } else {
                    let _ = writeln!(out, "{prefix}- {}", scalar(item));
                }
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                if val.is_object() || val.is_array() {
                    let _ = writeln!(out, "{prefix}{key}:");
                    write_yaml_value(out, val, indent + 1);
                } else {
                    let _ = writeln!(out, "{prefix}{key}: {}", scalar(val));
                }
            }
        }
        other => {
            let _ = writeln!(out, "{prefix}{}", scalar(other));
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
