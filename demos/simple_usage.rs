/// Simple example demonstrating how to use the Signature Analyzer library

use anyhow::Result;
use signature_analyzer::{ClassificationScheduler, SignatureTable};
use std::path::PathBuf;

fn main() -> Result<()> {
    let signatures = SignatureTable::from_lines([
        "\"ZIP archive\";\"PK\";\"zip\"",
        "\"Windows executable\";\"MZ\";\"exe\"",
        "\"PDF document\";\"%PDF\";\"pdf\"",
    ])?;

    // Create sample files
    let dir = std::env::temp_dir().join("signature_analyzer_demo");
    std::fs::create_dir_all(&dir)?;
    let samples: [(&str, &[u8]); 3] = [
        ("report.pdf", b"%PDF-1.7\n"),
        ("setup.exe", b"MZ\x90\x00"),
        ("readme.txt", b"hello"),
    ];
    let mut paths: Vec<PathBuf> = Vec::new();
    for (name, content) in samples {
        let path = dir.join(name);
        std::fs::write(&path, content)?;
        paths.push(path);
    }

    let results = ClassificationScheduler::new(2).classify_all(paths, &signatures)?;

    for result in &results {
        match result.file_type() {
            Some(file_type) => println!("{}: {}", result.file_name(), file_type),
            None => println!("{}: unreadable", result.file_name()),
        }
    }

    Ok(())
}
