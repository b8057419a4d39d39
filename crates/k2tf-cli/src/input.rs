use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// One YAML stream to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Path, or `<stdin>`.
    pub name: String,
    pub contents: String,
}

/// Read `-` from stdin, a file as-is, or every `.yml`/`.yaml` file of a
/// directory in name order.
pub fn read_sources(filepath: &str) -> Result<Vec<Source>> {
    if filepath == "-" {
        let mut contents = String::new();
        io::stdin()
            .read_to_string(&mut contents)
            .context("failed to read from stdin")?;
        return Ok(vec![Source {
            name: "<stdin>".to_string(),
            contents,
        }]);
    }

    let path = Path::new(filepath);
    if !path.is_dir() {
        return Ok(vec![read_file(path)?]);
    }

    let mut files = Vec::new();
    let entries =
        fs::read_dir(path).with_context(|| format!("failed to read directory {filepath}"))?;
    for entry in entries {
        let entry = entry?;
        let file = entry.path();
        if file.is_file() && is_yaml(&file) {
            files.push(file);
        } else {
            debug!(path = %file.display(), "skipping");
        }
    }
    files.sort();
    files.iter().map(|file| read_file(file)).collect()
}

fn read_file(path: &Path) -> Result<Source> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "read input");
    Ok(Source {
        name: path.display().to_string(),
        contents,
    })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "yml" || ext == "yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("k2tf-input-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_directory_reads_yaml_files_in_order() {
        let dir = scratch_dir("dir");
        fs::write(dir.join("b.yaml"), "kind: B\n").unwrap();
        fs::write(dir.join("a.yml"), "kind: A\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.join("nested.yaml")).unwrap();

        let sources = read_sources(dir.to_str().unwrap()).unwrap();
        let contents: Vec<_> = sources.iter().map(|s| s.contents.as_str()).collect();
        assert_eq!(contents, ["kind: A\n", "kind: B\n"]);
        assert!(sources[0].name.ends_with("a.yml"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_single_file() {
        let dir = scratch_dir("file");
        let file = dir.join("deployment.txt");
        fs::write(&file, "kind: Deployment\n").unwrap();

        let sources = read_sources(file.to_str().unwrap()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].contents, "kind: Deployment\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = read_sources("/nonexistent/k2tf/input.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/k2tf/input.yaml"));
    }
}
