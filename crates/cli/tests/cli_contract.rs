use assert_cmd::cargo::cargo_bin_cmd;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

fn write_pdf(dir: &Path, name: &str, texts: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => texts.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn ten_page_document(dir: &Path) -> PathBuf {
    let pages: Vec<Value> = (1..=10)
        .map(|page| {
            let text = match page {
                2 => "Introduction".to_string(),
                7 => "a short introduction".to_string(),
                _ => format!("chapter {page}"),
            };
            json!({ "width_pt": 612.0, "height_pt": 792.0, "text": text })
        })
        .collect();
    write_json(dir, "doc.json", &json!({ "pages": pages }))
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should contain valid json")
}

#[test]
fn info_reports_every_page_size() {
    let temp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(temp.path(), "two.pdf", &["Hello", "World"]);

    let output = cargo_bin_cmd!("pdf-annotator").arg("info").arg(&pdf).assert().success().get_output().clone();
    let value = stdout_json(&output);

    assert_eq!(value["page_count"], 2);
    assert_eq!(value["pages"][1]["page"], 2);
    assert_eq!(value["pages"][1]["width"], 612.0);
    assert_eq!(value["pages"][1]["height"], 792.0);
}

#[test]
fn info_accepts_json_page_descriptions() {
    let temp = tempfile::tempdir().unwrap();
    let doc = ten_page_document(temp.path());

    cargo_bin_cmd!("pdf-annotator")
        .arg("info")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page_count\": 10"));
}

#[test]
fn search_lists_matching_pages_in_a_pdf() {
    let temp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(temp.path(), "search.pdf", &["Preface", "Introduction", "Appendix"]);

    let output = cargo_bin_cmd!("pdf-annotator")
        .args(["search"])
        .arg(&pdf)
        .arg("INTRODUCTION")
        .assert()
        .success()
        .get_output()
        .clone();

    assert_eq!(stdout_json(&output)["matches"], json!([2]));
}

#[test]
fn replay_draws_searches_and_navigates() {
    let temp = tempfile::tempdir().unwrap();
    let doc = ten_page_document(temp.path());
    let script = write_json(
        temp.path(),
        "events.json",
        &json!([
            { "at_ms": 0, "event": { "type": "resize", "x": 0.0, "y": 0.0, "width": 612.0, "height": 792.0 } },
            { "at_ms": 10, "event": { "type": "set-tool", "tool": "draw" } },
            { "at_ms": 20, "event": { "type": "pointer-down", "x": 100.0, "y": 100.0 } },
            { "at_ms": 30, "event": { "type": "pointer-move", "x": 150.0, "y": 150.0 } },
            { "at_ms": 40, "event": { "type": "pointer-up", "x": 150.0, "y": 150.0 } },
            { "at_ms": 50, "event": { "type": "search-query-changed", "query": "intro" } },
            { "at_ms": 60, "event": { "type": "search-query-changed", "query": "introduction" } }
        ]),
    );
    let annotations = temp.path().join("annotations.json");

    let output = cargo_bin_cmd!("pdf-annotator")
        .arg("replay")
        .arg(&doc)
        .arg("--script")
        .arg(&script)
        .arg("--annotations-out")
        .arg(&annotations)
        .env_remove("PDF_ANNOTATOR_SEARCH_DEBOUNCE_MS")
        .assert()
        .success()
        .get_output()
        .clone();
    let value = stdout_json(&output);

    assert_eq!(value["search"]["matches"], json!([2, 7]));
    assert_eq!(value["view"]["current_page"], 2);
    assert_eq!(value["tools"]["active"], "draw");
    assert_eq!(value["annotations"]["1"]["strokes"][0]["points"].as_array().unwrap().len(), 2);
    assert_eq!(value["annotations"]["1"]["strokes"][0]["color"], "#e53935");

    let effects = value["effects"].as_array().unwrap();
    let scans: Vec<&Value> = effects.iter().filter(|e| e["type"] == "search-results").collect();
    assert_eq!(scans.len(), 1, "only the last query should be scanned");

    let saved: Value = serde_json::from_str(&fs::read_to_string(&annotations).unwrap()).unwrap();
    assert_eq!(saved["1"], value["annotations"]["1"]);
}

#[test]
fn replay_uses_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let doc = ten_page_document(temp.path());
    let script = write_json(temp.path(), "events.json", &json!([{ "at_ms": 0, "event": { "type": "tick" } }]));
    let config = temp.path().join("viewer.toml");
    fs::write(&config, "zoom_levels = [1.0, 2.0]\ndefault_zoom = 2.0\n").unwrap();

    let output = cargo_bin_cmd!("pdf-annotator")
        .arg("replay")
        .arg(&doc)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .env_remove("PDF_ANNOTATOR_DEFAULT_ZOOM")
        .assert()
        .success()
        .get_output()
        .clone();

    assert_eq!(stdout_json(&output)["view"]["zoom"], 2.0);
}

#[test]
fn replay_rejects_invalid_config() {
    let temp = tempfile::tempdir().unwrap();
    let doc = ten_page_document(temp.path());
    let script = write_json(temp.path(), "events.json", &json!([]));
    let config = temp.path().join("viewer.toml");
    fs::write(&config, "zoom_levels = [2.0, 1.0]\n").unwrap();

    cargo_bin_cmd!("pdf-annotator")
        .arg("replay")
        .arg(&doc)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("pdf-annotator")
        .arg("info")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("invalid.pdf");
    fs::write(&path, b"this is not a pdf").unwrap();

    cargo_bin_cmd!("pdf-annotator")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open document"));
}

#[test]
fn info_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("encrypted.pdf");
    fs::write(&path, b"%PDF-1.4\ntrailer << /Encrypt 5 0 R >>\n%%EOF\n").unwrap();

    cargo_bin_cmd!("pdf-annotator")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}
