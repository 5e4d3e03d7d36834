//! Sandboxed filesystem adapter
//!
//! Exposes a directory tree as a read-only connection. Every path argument is
//! resolved against the canonical root and rejected when it escapes it. CSV
//! files are described as tables using their header row.

use crate::error::{AgentError, Result};
use crate::execution::engine::{format_schema, BackendAdapter, ColumnInfo, NO_TABLES_FOUND};
use crate::execution::result::QueryRows;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Files larger than this are never read
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

pub struct FilesystemEngine {
    root: PathBuf,
}

impl FilesystemEngine {
    /// Open (creating if needed) the sandbox root.
    pub fn new(root_dir: impl AsRef<Path>) -> Result<Self> {
        let root_dir = root_dir.as_ref();
        std::fs::create_dir_all(root_dir)?;
        let root = root_dir.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` relative to the root, refusing anything outside it.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let denied = || AgentError::Backend(format!("Access denied: Path '{}' is outside sandbox.", path));

        let joined = normalize(&self.root.join(path));
        if !joined.starts_with(&self.root) {
            return Err(denied());
        }
        // Symlinks inside the tree may still point out of it
        if joined.exists() {
            let real = joined.canonicalize()?;
            if !real.starts_with(&self.root) {
                return Err(denied());
            }
            return Ok(real);
        }
        Ok(joined)
    }

    /// Entry names directly under `path`, sorted. A missing directory is empty.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        let dir = self.resolve(path)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    pub async fn read_file(&self, path: &str) -> Result<String> {
        let file = self.resolve(path)?;
        let meta = match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => meta,
            _ => return Err(AgentError::Backend("File not found.".to_string())),
        };
        if meta.len() > MAX_FILE_BYTES {
            warn!("Refusing to read {} ({} bytes)", file.display(), meta.len());
            return Err(AgentError::Backend("File too large (>10MB).".to_string()));
        }
        let bytes = tokio::fs::read(&file).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Plain files directly under the root with their sizes, sorted by name.
    async fn root_files(&self) -> Result<Vec<(String, u64)>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_file() {
                files.push((entry.file_name().to_string_lossy().into_owned(), meta.len()));
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Lexically fold `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_csv(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

fn table_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

fn csv_columns(path: &Path) -> Result<Vec<ColumnInfo>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AgentError::Backend(format!("Failed to open {}: {}", path.display(), e)))?;
    let headers = reader
        .headers()
        .map_err(|e| AgentError::Backend(format!("Failed to read CSV header: {}", e)))?;
    Ok(headers
        .iter()
        .map(|h| ColumnInfo {
            name: h.trim().to_string(),
            data_type: "text".to_string(),
            nullable: true,
        })
        .collect())
}

#[async_trait]
impl BackendAdapter for FilesystemEngine {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn query(&self, _sql: &str) -> Result<QueryRows> {
        Err(AgentError::Backend(
            "SQL queries are not supported on filesystem connections.".to_string(),
        ))
    }

    /// Root files under the names `get_schema` uses: CSV files by stem,
    /// everything else by file name.
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self
            .root_files()
            .await?
            .iter()
            .map(|(name, _)| {
                if is_csv(name) {
                    table_name(name).to_string()
                } else {
                    name.clone()
                }
            })
            .collect())
    }

    async fn get_schema(&self, table_filter: Option<&[String]>) -> Result<String> {
        let files = self.root_files().await?;
        let wanted = |file: &str| match table_filter {
            Some(names) => names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(file) || n.eq_ignore_ascii_case(table_name(file))),
            None => true,
        };

        let mut tables = Vec::new();
        let mut others = Vec::new();
        for (file, size) in files.iter().filter(|(f, _)| wanted(f.as_str())) {
            if is_csv(file) && *size <= MAX_FILE_BYTES {
                let path = self.root.join(file);
                let columns = tokio::task::spawn_blocking(move || csv_columns(&path))
                    .await
                    .map_err(|e| AgentError::Backend(format!("CSV worker failed: {}", e)))??;
                tables.push((table_name(file).to_string(), columns));
            } else {
                others.push(format!("- {} ({} bytes)", file, size));
            }
        }
        debug!(
            "Filesystem schema for {}: {} CSV tables, {} other files",
            self.root.display(),
            tables.len(),
            others.len()
        );

        match (tables.is_empty(), others.is_empty()) {
            (true, true) => Ok(NO_TABLES_FOUND.to_string()),
            (false, true) => Ok(format_schema(&tables)),
            (true, false) => Ok(format!("Files:\n{}", others.join("\n"))),
            (false, false) => Ok(format!(
                "{}\n\nFiles:\n{}",
                format_schema(&tables),
                others.join("\n")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, FilesystemEngine) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sales.csv"), "region, amount\nnorth,10\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let engine = FilesystemEngine::new(dir.path()).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_normalize_folds_parent_dirs() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let (_dir, engine) = sandbox();
        assert!(engine.resolve("../outside.txt").is_err());
        assert!(engine.resolve("nested/../../x").is_err());
        assert!(engine.resolve("/etc/passwd").is_err());
        assert!(engine.resolve("nested/../notes.txt").is_ok());
    }

    #[tokio::test]
    async fn test_list_and_read() {
        let (_dir, engine) = sandbox();
        assert_eq!(
            engine.list_directory(".").await.unwrap(),
            vec!["nested", "notes.txt", "sales.csv"]
        );
        assert!(engine.list_directory("missing").await.unwrap().is_empty());
        assert_eq!(engine.read_file("notes.txt").await.unwrap(), "hello");
        assert!(engine.read_file("nope.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_schema_describes_csv_headers() {
        let (_dir, engine) = sandbox();
        let schema = engine.get_schema(None).await.unwrap();
        assert!(schema.starts_with("Table: sales"));
        assert!(schema.contains("- region (text) [NULLABLE]"));
        assert!(schema.contains("- amount (text) [NULLABLE]"));
        assert!(schema.contains("- notes.txt (5 bytes)"));

        let filtered = engine.get_schema(Some(&["sales".to_string()])).await.unwrap();
        assert!(!filtered.contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_table_names_match_schema() {
        let (_dir, engine) = sandbox();
        assert_eq!(engine.list_tables().await.unwrap(), vec!["notes.txt", "sales"]);
        let schema = engine.get_schema(None).await.unwrap();
        assert!(schema.contains("Table: sales"));
    }

    #[tokio::test]
    async fn test_query_is_unsupported() {
        let (_dir, engine) = sandbox();
        assert!(matches!(engine.query("SELECT 1").await, Err(AgentError::Backend(_))));
    }
}
