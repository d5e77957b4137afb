use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;
use tracing::debug;

use arbor_diff::{ArrayChange, Change, Comparator, DiffConfig, DocumentComparison};
use arbor_types::{Pointer, PointerPattern};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Compare(args) => cmd_compare(args),
        Command::Pattern(args) => cmd_pattern(args),
    }
}

fn cmd_compare(args: CompareArgs) -> anyhow::Result<()> {
    let old = load_document(&args.old)?;
    let new = load_document(&args.new)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DiffConfig::default(),
    };
    let old_label = args.old_label.unwrap_or_else(|| label_for(&args.old));
    let new_label = args.new_label.unwrap_or_else(|| label_for(&args.new));

    let mut comparator = Comparator::new(config);
    let comparison = comparator
        .compare(&old, old_label, &new, new_label)
        .context("comparison failed")?;
    debug!(stats = ?comparator.cache_stats(), "cache activity");

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Text => print!("{}", render_text(&comparison)),
    }
    Ok(())
}

fn cmd_pattern(args: PatternArgs) -> anyhow::Result<()> {
    let pattern = PointerPattern::parse(&args.pattern)
        .with_context(|| format!("invalid pattern '{}'", args.pattern))?;
    let pointer = Pointer::parse(&args.pointer);
    if pattern.matches(&pointer) {
        println!("{} {} matches {}", "✓".green().bold(), pointer, pattern);
    } else {
        println!("{} {} does not match {}", "✗".red().bold(), pointer, pattern);
    }
    Ok(())
}

pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub fn load_config(path: &Path) -> anyhow::Result<DiffConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => DiffConfig::from_toml_str(&text),
        Some("json") => DiffConfig::from_json_str(&text),
        _ => bail!("unsupported config format for {} (expected .toml or .json)", path.display()),
    };
    config.with_context(|| format!("failed to load config {}", path.display()))
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn render_text(comparison: &DocumentComparison) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", "---".red(), comparison.old_label.bold()));
    out.push_str(&format!("{} {}\n", "+++".green(), comparison.new_label.bold()));
    if comparison.is_empty() {
        out.push_str("No differences.\n");
        return out;
    }
    for change in &comparison.changes {
        render_change(&mut out, change, 0);
    }
    out.push_str(&format!(
        "\n{} changes ({} added, {} deleted, {} modified, {} arrays), score {}\n",
        comparison.len(),
        comparison.additions(),
        comparison.deletions(),
        comparison.modifications(),
        comparison.array_changes(),
        comparison.score.to_string().bold()
    ));
    out
}

fn render_change(out: &mut String, change: &Change, depth: usize) {
    let indent = "  ".repeat(depth);
    match change {
        Change::PropertyAdded { pointer, value, .. } => {
            out.push_str(&format!("{indent}{} {}: {}\n", "+".green(), pointer, value));
        }
        Change::PropertyDeleted { pointer, value, .. } => {
            out.push_str(&format!("{indent}{} {}: {}\n", "-".red(), pointer, value));
        }
        Change::PropertyChanged {
            new_pointer,
            old_value,
            new_value,
            ..
        } => {
            out.push_str(&format!(
                "{indent}{} {}: {} → {}\n",
                "~".yellow(),
                new_pointer,
                old_value.to_string().red(),
                new_value.to_string().green()
            ));
        }
        Change::ArrayChanged(array) => render_array(out, array, depth),
    }
}

fn render_array(out: &mut String, array: &ArrayChange, depth: usize) {
    let indent = "  ".repeat(depth);
    let key = match &array.match_property {
        Some(property) => format!("{} on {}", array.match_method, property),
        None => array.match_method.to_string(),
    };
    out.push_str(&format!(
        "{indent}{} {} [{}]: {} matched, {} added, {} removed\n",
        "*".cyan(),
        array.new_pointer,
        key.dimmed(),
        array.matched_indices.len(),
        array.added_items.len(),
        array.removed_items.len()
    ));
    for item in &array.removed_items {
        out.push_str(&format!("{indent}  {} {}: {}\n", "-".red(), item.pointer, item.element));
    }
    for item in &array.added_items {
        out.push_str(&format!("{indent}  {} {}: {}\n", "+".green(), item.pointer, item.element));
    }
    for (sub, selected) in array
        .sub_changes
        .iter()
        .map(|sub| (sub, false))
        .chain(array.out_of_tree.iter().map(|sub| (sub, true)))
    {
        let marker = if selected { " (selected)" } else { "" };
        out.push_str(&format!(
            "{indent}  {} → {}{}\n",
            sub.old_pointer,
            sub.new_pointer,
            marker.dimmed()
        ));
        for change in &sub.changes {
            render_change(out, change, depth + 2);
        }
    }
}
