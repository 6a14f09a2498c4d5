mod common;

use rayon::prelude::*;
use std::fs;
use std::path::Path;

use docxide_format::{Error, FormattingSettings, assemble_formatting_bytes};

struct SweepResult {
    name: String,
    parts: usize,
    pass: bool,
    detail: String,
}

fn analyze_fixture(fixture_dir: &Path) -> Option<SweepResult> {
    let name = common::display_name(fixture_dir);
    let input = fs::read(fixture_dir.join("input.docx")).ok()?;
    let settings = FormattingSettings::default();

    let output = match assemble_formatting_bytes(&input, &settings) {
        Ok(bytes) => bytes,
        Err(e @ (Error::UnsupportedLanguage(_) | Error::UnsupportedNumberingFormat(_))) => {
            println!("  [SKIP] {name}: {e}");
            return None;
        }
        Err(e) => {
            return Some(SweepResult {
                name,
                parts: 0,
                pass: false,
                detail: e.to_string(),
            });
        }
    };

    let document = common::read_part(&output, "word/document.xml");
    let leftover = match roxmltree::Document::parse(&document) {
        Ok(doc) => doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().namespace() == Some(common::FORMAT_NS))
            .count(),
        Err(e) => {
            return Some(SweepResult {
                name,
                parts: 1,
                pass: false,
                detail: e.to_string(),
            });
        }
    };
    // font name tags mark the output, so a second pass must be refused
    let rerun = assemble_formatting_bytes(&output, &settings);
    let rejected = matches!(rerun, Err(Error::AlreadyAnnotated(_)));

    let detail = if leftover > 0 {
        format!("{leftover} annotation elements left")
    } else if !rejected {
        "second pass over the output was not rejected".to_string()
    } else {
        String::new()
    };
    Some(SweepResult {
        name,
        parts: count_parts(&output),
        pass: leftover == 0 && rejected,
        detail,
    })
}

fn count_parts(docx: &[u8]) -> usize {
    zip::ZipArchive::new(std::io::Cursor::new(docx))
        .map(|a| a.len())
        .unwrap_or(0)
}

#[test]
fn fixtures_assemble_cleanly() {
    let _ = env_logger::try_init();
    let fixtures = common::discover_fixtures().expect("Failed to read tests/fixtures");
    if std::env::var("DOCXIDE_CASE").is_err() {
        assert!(!fixtures.is_empty(), "no fixtures under tests/fixtures");
    }

    let mut results: Vec<SweepResult> = fixtures
        .par_iter()
        .filter_map(|f| analyze_fixture(f))
        .collect();
    results.sort_by(|a, b| a.name.cmp(&b.name));

    let name_w = results.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    let sep = format!("+-{}-+------+-------+", "-".repeat(name_w));

    println!("\n{sep}");
    println!("| {:<name_w$} | Pass | Parts |", "Case");
    println!("{sep}");
    let mut all_pass = true;
    for r in &results {
        let status = if r.pass { "Y" } else { "N" };
        println!("| {:<name_w$} | {:<4} | {:>5} |", r.name, status, r.parts);
        if !r.pass {
            println!("    {}", r.detail);
            all_pass = false;
        }
    }
    println!("{sep}");
    assert_eq!(results.len(), fixtures.len(), "some fixtures were skipped");
    assert!(all_pass, "Some fixtures failed to assemble, see details above");
}
