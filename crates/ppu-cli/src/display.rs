//! Plain-text rendering for update records, field checks and search results.

use ppu_core::{CaseSnapshot, Label, UpdateRecord};
use ppu_sync::SearchPage;

const MAX_TEXT: usize = 60;

// ── Record card sections ──

const IDENTITY: &[&str] = &["registro_ppu", "e_situacional", "denunciado"];

const DEADLINE: &[&str] = &["tipoPlazo", "audiencia", "accion", "plazo_atencion"];

const DATES: &[&str] = &["fecha_ingreso", "fecha_atencion", "reprogramacion"];

/// Print the label preview with its prefix on a separate line.
pub fn print_label(label: &Label) {
    println!("  prefix:        {}", label.prefix());
    if !label.free_text().is_empty() {
        println!("  free text:     {}", label.free_text());
    }
    println!("  e_situacional: {label}");
}

/// Print a masked field value and its inline error, if any.
pub fn print_field(name: &str, value: &str, error: Option<String>) {
    match error {
        Some(e) => println!("  {name:<10} {value:<12} ✗ {e}"),
        None => println!("  {name:<10} {value:<12} ✓"),
    }
}

/// Print each record as a grouped card.
pub fn print_records(records: &[UpdateRecord]) -> anyhow::Result<()> {
    for (i, record) in records.iter().enumerate() {
        let value = serde_json::to_value(record)?;
        println!("── registro {}/{} ──", i + 1, records.len());
        print_section("Caso", IDENTITY, &value);
        print_section("Plazo", DEADLINE, &value);
        print_section("Fechas", DATES, &value);
        println!();
    }
    Ok(())
}

fn print_section(title: &str, keys: &[&str], value: &serde_json::Value) {
    let present: Vec<(&str, String)> = keys
        .iter()
        .filter_map(|k| value.get(*k).map(|v| (*k, scalar(v))))
        .collect();
    if present.is_empty() {
        return;
    }
    println!("  {title}");
    for (key, text) in present {
        println!("    {key:<16} {text}");
    }
}

fn scalar(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) if s.is_empty() => "(vacío)".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print one page of search results.
pub fn print_search_page(page: &SearchPage) {
    println!(
        "  página {}/{}, {} registros",
        page.page, page.total_pages, page.total_records
    );
    for case in &page.data {
        print_case_line(case);
    }
}

fn print_case_line(case: &CaseSnapshot) {
    let id = case.case_id().unwrap_or("-");
    print!("    {:<20}", id);
    if let Some(name) = case.denunciado.as_deref()
        && !name.is_empty()
    {
        print!("  {}", name);
    }
    println!();
    if let Some(status) = case.e_situacional.as_deref() {
        println!("      {}", truncate(status, MAX_TEXT));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "Ñ".repeat(70);
        let t = truncate(&s, 60);
        assert_eq!(t.chars().count(), 60);
        assert!(t.ends_with("..."));
        assert_eq!(truncate("corto", 60), "corto");
    }

    #[test]
    fn scalar_formatting() {
        assert_eq!(scalar(&serde_json::json!("")), "(vacío)");
        assert_eq!(scalar(&serde_json::json!("SI")), "SI");
        assert_eq!(scalar(&serde_json::json!(true)), "true");
    }
}
