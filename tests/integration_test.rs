/// Integration tests for the signature analyzer
///
/// These tests run the whole pipeline on scratch directories: loading a
/// signature database, enumerating files and classifying them concurrently.

use std::fs;
use std::path::Path;

use signature_analyzer::app::run_classifier;
use signature_analyzer::config::AnalyzerConfig;
use signature_analyzer::{
    classify_file, ClassificationScheduler, SignatureLoadError, SignatureTable, TaskState,
    UNKNOWN_FILE_TYPE,
};

const SIGNATURES: &str = "\"A\";\"PK\";\"zip\"\n\"B\";\"MZ\";\"exe\"\n";

fn write_signatures(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("signatures.txt");
    fs::write(&path, SIGNATURES).expect("Failed to write signature file");
    path
}

fn types_by_name(dir: &Path, config: &AnalyzerConfig, db: &Path) -> Vec<(String, String)> {
    run_classifier(dir, db, config)
        .expect("Classification failed")
        .iter()
        .map(|r| {
            (
                r.file_name(),
                r.file_type().unwrap_or("<failed>").to_string(),
            )
        })
        .collect()
}

#[test]
fn test_classify_directory() {
    let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = write_signatures(db_dir.path());

    let data = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(data.path().join("app.exe"), b"MZ\x90\x00\x03\x00\x00\x00").unwrap();
    fs::write(data.path().join("archive.zip"), b"PK\x03\x04\x14\x00").unwrap();
    fs::write(data.path().join("both.bin"), b"PK\x03\x04 ... MZ").unwrap();
    fs::write(data.path().join("notes.txt"), b"just some text").unwrap();
    fs::write(data.path().join("empty"), b"").unwrap();

    let results = types_by_name(data.path(), &AnalyzerConfig::default(), &db);

    assert_eq!(
        results,
        vec![
            ("app.exe".to_string(), "exe".to_string()),
            ("archive.zip".to_string(), "zip".to_string()),
            ("both.bin".to_string(), "exe".to_string()),
            ("empty".to_string(), UNKNOWN_FILE_TYPE.to_string()),
            ("notes.txt".to_string(), UNKNOWN_FILE_TYPE.to_string()),
        ]
    );
}

#[test]
fn test_worker_count_does_not_change_results() {
    let db_dir = tempfile::tempdir().unwrap();
    let db = write_signatures(db_dir.path());

    let data = tempfile::tempdir().unwrap();
    for i in 0..50 {
        let content: &[u8] = match i % 5 {
            0 => b"MZ",
            1 => b"..PK..",
            2 => b"",
            3 => b"\xff\xfe\x00\x80",
            _ => b"PKMZ",
        };
        fs::write(data.path().join(format!("file{:03}", i)), content).unwrap();
    }

    let single = AnalyzerConfig {
        workers: 1,
        ..Default::default()
    };
    let many = AnalyzerConfig {
        workers: 16,
        ..Default::default()
    };

    let a = types_by_name(data.path(), &single, &db);
    let b = types_by_name(data.path(), &many, &db);
    assert_eq!(a.len(), 50);
    assert_eq!(a, b);
}

#[test]
fn test_unreadable_entry_is_reported_not_fatal() {
    let db_dir = tempfile::tempdir().unwrap();
    let db = write_signatures(db_dir.path());
    let signatures = SignatureTable::load(&db).unwrap();

    let data = tempfile::tempdir().unwrap();
    let good = data.path().join("good.exe");
    fs::write(&good, b"MZ").unwrap();
    let gone = data.path().join("gone.bin");

    let results = ClassificationScheduler::new(4)
        .classify_all(vec![good, gone], &signatures)
        .unwrap();

    let mut states: Vec<_> = results.iter().map(|r| (r.file_name(), r.state())).collect();
    states.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        states,
        vec![
            ("gone.bin".to_string(), TaskState::Failed),
            ("good.exe".to_string(), TaskState::Completed),
        ]
    );
}

#[test]
fn test_malformed_signature_file_stops_before_classification() {
    let db_dir = tempfile::tempdir().unwrap();
    let db = db_dir.path().join("bad.txt");
    fs::write(&db, "A;PK;zip\nbroken line\n").unwrap();

    let err = SignatureTable::load(&db).unwrap_err();
    match err {
        SignatureLoadError::Parse(e) => {
            assert_eq!(e.line_number, 2);
            assert_eq!(e.line, "broken line");
        }
        other => panic!("unexpected error: {}", other),
    }

    let data = tempfile::tempdir().unwrap();
    fs::write(data.path().join("a.zip"), b"PK").unwrap();
    assert!(run_classifier(data.path(), &db, &AnalyzerConfig::default()).is_err());
}

#[test]
fn test_blank_signature_line_is_rejected() {
    let db_dir = tempfile::tempdir().unwrap();
    let db = db_dir.path().join("blank.txt");
    fs::write(&db, "A;PK;zip\n   \nB;MZ;exe\n").unwrap();

    match SignatureTable::load(&db).unwrap_err() {
        SignatureLoadError::Parse(e) => assert_eq!(e.line_number, 2),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_directory_is_an_error() {
    let db_dir = tempfile::tempdir().unwrap();
    let db = write_signatures(db_dir.path());
    let missing = db_dir.path().join("no-such-dir");

    assert!(run_classifier(&missing, &db, &AnalyzerConfig::default()).is_err());
    assert!(run_classifier(db_dir.path(), &missing, &AnalyzerConfig::default()).is_err());
}

#[test]
fn test_classify_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = write_signatures(dir.path());
    let file = dir.path().join("sample");
    fs::write(&file, b"\x00\x00PK\x03\x04").unwrap();

    assert_eq!(classify_file(&file, &db).unwrap(), "zip");
}

#[test]
fn test_high_byte_signature() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.txt");
    fs::write(&db, b"PNG;\x89PNG;png\nJPEG;\xff\xd8\xff;jpeg\n").unwrap();

    let png = dir.path().join("image.png");
    fs::write(&png, b"\x89PNG\r\n\x1a\n").unwrap();
    let jpeg = dir.path().join("photo.jpg");
    fs::write(&jpeg, b"\xff\xd8\xff\xe0\x00\x10JFIF").unwrap();

    assert_eq!(classify_file(&png, &db).unwrap(), "png");
    assert_eq!(classify_file(&jpeg, &db).unwrap(), "jpeg");
}
