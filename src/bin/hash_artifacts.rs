//! Manifest utility for Cardiolens model artifacts.
//!
//! Writes `manifest.json` next to a model artifact, binding it (and any
//! extra files in the same directory) to their SHA-256 digests. With
//! `CARDIOLENS_REQUIRE_MANIFEST=1` the dashboard refuses to start unless the
//! manifest verifies.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_artifacts -- <model.json> [extra files...]
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use cardiolens::adapters::model::{sha256_hex, ArtifactManifest, ModelArtifact, MANIFEST_FILE};

fn usage() -> anyhow::Error {
    anyhow!("Usage: hash_artifacts <model.json> [extra files...]")
}

fn parse_args() -> Result<(PathBuf, Vec<String>)> {
    let mut args = env::args().skip(1);
    let model_path = match args.next().as_deref() {
        None | Some("-h" | "--help") => return Err(usage()),
        Some(path) => PathBuf::from(path),
    };
    Ok((model_path, args.collect()))
}

/// `path` with `.` components dropped. `..` is refused outright.
fn normalize(path: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => bail!("{path:?} must not contain '..'"),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// File name relative to the model directory; manifests never reach outside it.
///
/// A bare file name is taken to live in the model directory.
fn relative_name(base_dir: &Path, rel: &str) -> Result<String> {
    let path = normalize(Path::new(rel))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name {rel:?}"))?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        if parent != normalize(base_dir)? {
            bail!("{rel:?} is not in the model directory {base_dir:?}");
        }
    }
    Ok(name.to_string())
}

fn main() -> Result<()> {
    let (model_path, extras) = parse_args()?;

    let base_dir = model_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    // Refuse to bless an artifact the dashboard could not load.
    let content =
        fs::read(&model_path).with_context(|| format!("Failed to read {model_path:?}"))?;
    let artifact: ModelArtifact = serde_json::from_slice(&content)
        .with_context(|| format!("{model_path:?} is not a model artifact"))?;
    artifact.validate()?;

    let mut files: BTreeMap<String, String> = BTreeMap::new();
    let model_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name {model_path:?}"))?;
    files.insert(model_name.to_string(), sha256_hex(&content));

    for extra in &extras {
        let name = relative_name(&base_dir, extra)?;
        let path = base_dir.join(&name);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name, sha256_hex(&bytes));
    }

    let manifest = ArtifactManifest {
        version: 1,
        created_at: Some(chrono::Utc::now().timestamp()),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = base_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    println!("Wrote manifest: {manifest_path:?}");
    for (name, digest) in &manifest.files {
        println!("  {digest}  {name}");
    }

    Ok(())
}
