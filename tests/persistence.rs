//! Persistence tests: config and session state survive a save/reload cycle
//! and feed the pipeline unchanged.

use std::path::Path;

use quill::config::QuillConfig;
use quill::ingest::{MediaKind, PdfMode};
use quill::paths::QuillPaths;
use quill::prompt::CitationSet;
use quill::session::{SessionSnapshot, StoredFile};

fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn session_files_survive_restart_with_sources() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = QuillPaths::rooted(dir.path());
    paths.ensure_dirs().unwrap();

    // First run: store two files and cite the second.
    {
        let mut session = SessionSnapshot::load(&paths.session_file()).unwrap();
        session.context = "Week 6: interviews".into();
        session.add_file(StoredFile::read(&write(dir.path(), "notes.txt", b"plain notes")).unwrap());
        session.add_file(StoredFile::read(&write(dir.path(), "ch6.pdf", b"%PDF-1.7")).unwrap());
        session.set_source(1, "https://example.edu/ch6").unwrap();
        session.save(&paths.session_file()).unwrap();
    }

    // Second run: reload and rebuild resources.
    {
        let session = SessionSnapshot::load(&paths.session_file()).unwrap();
        assert_eq!(session.context, "Week 6: interviews");

        let resources = session.resources().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].media_kind, MediaKind::PlainText);
        assert_eq!(resources[0].bytes, b"plain notes");
        assert_eq!(resources[1].media_kind, MediaKind::Pdf);

        let citations = CitationSet::from_resources(&resources);
        assert_eq!(citations.len(), 1);
        assert_eq!(
            citations.iter().next().unwrap().url,
            "https://example.edu/ch6"
        );
    }

    // Reset wipes everything.
    assert!(SessionSnapshot::reset(&paths.session_file()).unwrap());
    let fresh = SessionSnapshot::load(&paths.session_file()).unwrap();
    assert_eq!(fresh, SessionSnapshot::default());
}

#[test]
fn removing_a_file_shifts_positions() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let mut session = SessionSnapshot::default();
    for name in ["a.txt", "b.txt", "c.txt"] {
        session.add_file(StoredFile::from_bytes(name, "text/plain", name.as_bytes()));
    }
    session.remove_file(1).unwrap();
    session.set_source(1, "https://example.edu/c").unwrap();
    session.save(&path).unwrap();

    let reloaded = SessionSnapshot::load(&path).unwrap();
    let names: Vec<_> = reloaded.stored_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "c.txt"]);
    assert_eq!(reloaded.stored_files[1].source_url, "https://example.edu/c");
}

#[test]
fn config_round_trips_through_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = QuillPaths::rooted(dir.path());

    let mut config = QuillConfig::default();
    config.ingest.pdf_mode = PdfMode::Extract;
    config.provider.model = "gpt-5.2".into();
    config.save(&paths.config_file()).unwrap();

    let loaded = QuillConfig::load_or_default(&paths.config_file()).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.ingest.pdf_mode, PdfMode::Extract);
}
