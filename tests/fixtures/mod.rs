//! Test fixtures for deterministic testing

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `contents` to `path`, creating parent directories.
pub fn write_file_sync<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_ref())
}

/// Create a legacy project with a `cypress.json` and the given files.
///
/// Each file's content is a comment naming its original path, so a moved
/// file can be traced back to where it came from.
pub fn create_legacy_project(base: &Path, config: &str, files: &[&str]) -> std::io::Result<PathBuf> {
    let root = base.join("project");
    fs::create_dir_all(&root)?;
    write_file_sync(root.join("cypress.json"), config)?;
    for file in files {
        write_file_sync(root.join(file), format!("// {file}\n"))?;
    }
    Ok(root)
}

/// A typical untouched project on the default layout
pub fn create_default_project(base: &Path) -> std::io::Result<PathBuf> {
    create_legacy_project(
        base,
        r#"{ "baseUrl": "http://localhost:3000", "video": false }"#,
        &[
            "cypress/integration/login.spec.js",
            "cypress/integration/admin/users_spec.ts",
            "cypress/integration/home.js",
            "cypress/integration/notes.txt",
            "cypress/component/Button.spec.tsx",
            "cypress/component/Card.cy.jsx",
            "cypress/fixtures/user.json",
        ],
    )
}

/// A project whose specs all convert automatically.
pub fn create_clean_project(base: &Path, count: usize) -> std::io::Result<PathBuf> {
    let files: Vec<String> = (0..count)
        .map(|i| format!("cypress/integration/spec{i:03}.spec.js"))
        .collect();
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();
    create_legacy_project(base, "{}", &refs)
}
