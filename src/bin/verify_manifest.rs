use anyhow::{Context, Result};
use callsynth::output::{hash_path, read_manifest, MANIFEST_FILE, META_DIR};
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let root_arg = env::args()
        .nth(1)
        .context("Usage: cargo run --bin verify_manifest -- <output-directory>")?;
    let root = PathBuf::from(root_arg);
    let manifest_path = root.join(META_DIR).join(MANIFEST_FILE);
    let manifest = read_manifest(&manifest_path)
        .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;

    let mut failures = Vec::new();
    let mut listed = BTreeSet::new();
    for entry in manifest.entries() {
        listed.insert(entry.path.clone());
        let path = root.join(&entry.path);
        if !path.exists() {
            failures.push(format!("[missing] {}", entry.path));
            continue;
        }
        let current_hash = hash_path(&path)
            .with_context(|| format!("Unable to open {} for hashing", path.display()))?;
        if current_hash != entry.sha256 {
            failures.push(format!(
                "[mismatch] {} expected {}, found {}",
                entry.path, entry.sha256, current_hash
            ));
        }
    }

    let manifest_rel = format!("{META_DIR}/{MANIFEST_FILE}");
    for entry in WalkDir::new(&root).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), root.display()))?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if relative != manifest_rel && !listed.contains(&relative) {
            failures.push(format!("[stray] {relative}"));
        }
    }

    if failures.is_empty() {
        println!(
            "Manifest {} verified: {} files match recorded hashes.",
            manifest_path.display(),
            manifest.file_count()
        );
        Ok(())
    } else {
        println!("Manifest verification failed:");
        for failure in &failures {
            println!("  - {}", failure);
        }
        anyhow::bail!(
            "Manifest verification failed ({} problems)",
            failures.len()
        )
    }
}
