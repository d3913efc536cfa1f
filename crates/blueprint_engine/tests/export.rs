use std::fs;

use blueprint_core::{Candidate, FraudRisk, Idea, SimilarityReport};
use blueprint_engine::{
    ensure_output_dir, export_breakdown, export_similarity_report, AtomicFileWriter,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn report() -> SimilarityReport {
    SimilarityReport {
        fraud_risk: Some(FraudRisk::High),
        originality_score: Some(42.0),
        total_projects: 2,
        submission_date: Some("2024-10-01".to_string()),
        project_name: Some("Demo: App".to_string()),
    }
}

fn candidate(url: &str, score: Option<f64>) -> Candidate {
    Candidate {
        url: url.to_string(),
        name: url.rsplit('/').next().unwrap_or(url).to_string(),
        platform: "Devpost".to_string(),
        ai_similarity: score,
        ..Candidate::default()
    }
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("state.ron", "one").unwrap();
    let second = writer.write("state.ron", "two").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "two");
}

#[test]
fn writing_into_a_file_path_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("report.json", "{}").is_err());
    assert!(!file_path.with_file_name("report.json").exists());
}

#[test]
fn similarity_report_is_written_as_json() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());
    let high = candidate("https://devpost.com/software/high", Some(91.0));
    let low = candidate("https://devpost.com/software/low", None);

    let path = export_similarity_report(
        &writer,
        "https://devpost.com/software/demo",
        &report(),
        vec![&high, &low],
        "2024-10-02T10:00:00Z",
    )
    .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Demo-App--"), "{name}");
    assert!(name.ends_with(".json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["devpost_url"], "https://devpost.com/software/demo");
    assert_eq!(json["generated_utc"], "2024-10-02T10:00:00Z");
    assert_eq!(json["report"]["fraud_risk"], "HIGH");
    assert_eq!(json["candidates"][0]["name"], "high");
    assert_eq!(json["candidates"][1]["name"], "low");
    assert!(json["candidates"][1].get("ai_similarity").is_none());
}

#[test]
fn breakdown_is_written_as_markdown_with_title() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("guides"));
    let idea = Idea {
        number: 3,
        title: "Campus Compass".to_string(),
        ..Idea::default()
    };

    let path = export_breakdown(&writer, "cal-hacks", &idea, "## Step 1\nBuild it\n\n").unwrap();

    assert!(path.starts_with(temp.path().join("guides")));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# Campus Compass\n\n## Step 1\nBuild it\n"
    );

    // Same idea in the same folder maps to the same file.
    let again = export_breakdown(&writer, "cal-hacks", &idea, "new").unwrap();
    assert_eq!(path, again);
}
