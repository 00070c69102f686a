use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes `files` into a fresh temp directory and returns its path.
pub(crate) fn temp_unit(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let run_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_dir = std::env::temp_dir().join(format!(
        "fbc_test_{}_{}_{}",
        name,
        std::process::id(),
        run_id
    ));
    std::fs::create_dir_all(&temp_dir).expect("failed to create temp dir");
    for (file, contents) in files {
        std::fs::write(temp_dir.join(file), contents).expect("failed to write temp file");
    }
    temp_dir
}
