use anyhow::{Context, Result, bail};
use line_metadata::Manifest;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "line.json";

#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub manifest: Manifest,
}

pub fn load_manifest(manifest_path: Option<&Path>) -> Result<LoadedManifest> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let path = match manifest_path {
        Some(p) => resolve_against(&cwd, p),
        None => cwd.join(DEFAULT_MANIFEST_NAME),
    };

    if !path.exists() {
        bail!(
            "manifest not found: {} (run `line init` to create one)",
            path.display()
        );
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let manifest = Manifest::from_json(&contents)
        .with_context(|| format!("failed to load manifest: {}", path.display()))?;
    tracing::debug!(path = %path.display(), name = %manifest.name, "loaded manifest");

    Ok(LoadedManifest { path, manifest })
}

pub fn write_default_manifest(
    project_dir: &Path,
    name: Option<&str>,
    overwrite: bool,
) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_MANIFEST_NAME);
    if dest.exists() && !overwrite {
        bail!(
            "{DEFAULT_MANIFEST_NAME} already exists in {} (use --force to overwrite)",
            project_dir.display()
        );
    }

    let project_name = match name {
        Some(name) => name.to_string(),
        None => guess_project_name(project_dir).unwrap_or_else(|| "my-cli".to_string()),
    };

    let out = Manifest::sample(&project_name)
        .to_json_pretty()
        .context("failed to serialize manifest")?;

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn guess_project_name(project_dir: &Path) -> Option<String> {
    // `.` has no file name; fall back to the current directory's.
    let file_name = project_dir.file_name().and_then(|s| s.to_str());
    let direct = file_name.filter(|s| !s.is_empty() && *s != "." && *s != "..");
    if let Some(name) = direct {
        return Some(name.to_string());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = std::process::id();
        let dir = std::env::temp_dir().join(format!("line-{prefix}-{pid}-{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_manifest_round_trips() {
        let dir = make_temp_dir("default-manifest").join("todo");
        fs::create_dir_all(&dir).unwrap();

        let path = write_default_manifest(&dir, None, false).unwrap();
        assert_eq!(path, dir.join(DEFAULT_MANIFEST_NAME));
        assert!(!dir.join("line.tmp").exists());

        let loaded = load_manifest(Some(&path)).unwrap();
        assert_eq!(loaded.manifest.name, "todo");
        assert!(loaded.manifest.command.signature.starts_with("todo "));
        assert!(loaded.manifest.to_cli().is_ok());

        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn existing_manifest_needs_overwrite() {
        let dir = make_temp_dir("overwrite");

        write_default_manifest(&dir, Some("first"), false).unwrap();
        let err = write_default_manifest(&dir, Some("second"), false).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");

        let path = write_default_manifest(&dir, Some("second"), true).unwrap();
        let loaded = load_manifest(Some(&path)).unwrap();
        assert_eq!(loaded.manifest.name, "second");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = make_temp_dir("missing");
        let err = load_manifest(Some(&dir.join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("manifest not found"), "{err}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn guesses_name_from_directory() {
        assert_eq!(
            guess_project_name(Path::new("/tmp/some-tool")).as_deref(),
            Some("some-tool")
        );
    }
}
