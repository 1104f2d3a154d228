//! Transitive import resolution for multi-file compilation.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::internal::errors::{Error, Result};
use crate::internal::path::{canonicalize_path, resolve_logical_import, to_logical};
use crate::internal::source_text::strip_comments;

static IMPORT: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?s)\bimport\s+(?:[^;"']*?\s+from\s+)?["']([^"']+)["']"#)
    .expect("valid import regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
  pub logical_path: String,
  pub content: String,
}

/// Every source unit reachable from an entry file, keyed by logical path.
#[derive(Debug, Clone)]
pub struct SourceSet {
  entry: String,
  units: BTreeMap<String, SourceUnit>,
}

impl SourceSet {
  pub fn entry(&self) -> &str {
    &self.entry
  }

  pub fn get(&self, logical_path: &str) -> Option<&SourceUnit> {
    self.units.get(logical_path)
  }

  pub fn content(&self, logical_path: &str) -> Option<&str> {
    self.units.get(logical_path).map(|unit| unit.content.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = &SourceUnit> {
    self.units.values()
  }

  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.units.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }
}

/// Read access to sources by logical path.
pub trait SourceProvider {
  fn read(&self, logical_path: &str) -> io::Result<String>;

  fn resolve_import(&self, importer: &str, import: &str) -> String {
    resolve_logical_import(importer, import)
  }
}

/// Sources on disk. Logical paths are relative to `base_dir`; paths missing
/// there are looked up as Node packages (`node_modules`).
#[derive(Debug, Clone)]
pub struct FsSourceProvider {
  base_dir: PathBuf,
}

impl FsSourceProvider {
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: base_dir.into(),
    }
  }

  /// Builds a provider rooted at the entry file's directory and returns the entry's logical path.
  pub fn for_entry(entry: &Path) -> Result<(Self, String)> {
    if !entry.is_file() {
      return Err(Error::io(entry, "no such file"));
    }
    let canonical = canonicalize_path(entry);
    let base_dir = canonical
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));
    let logical = to_logical(&base_dir, &canonical);
    Ok((Self::new(base_dir), logical))
  }

  fn locate(&self, logical_path: &str) -> io::Result<PathBuf> {
    let direct = self.base_dir.join(logical_path);
    if direct.is_file() {
      return Ok(direct);
    }
    node_resolve::resolve_from(logical_path, self.base_dir.clone())
      .map_err(|err| io::Error::new(io::ErrorKind::NotFound, err.to_string()))
  }
}

impl SourceProvider for FsSourceProvider {
  fn read(&self, logical_path: &str) -> io::Result<String> {
    let path = self.locate(logical_path)?;
    std::fs::read_to_string(path)
  }
}

/// Import paths declared by `source`, in declaration order.
pub fn parse_imports(source: &str) -> Vec<String> {
  let stripped = strip_comments(source);
  IMPORT
    .captures_iter(&stripped)
    .map(|captures| captures[1].to_string())
    .collect()
}

/// Walks imports depth-first from `entry`, reading every distinct logical path once.
pub fn resolve(entry: &str, provider: &impl SourceProvider) -> Result<SourceSet> {
  let content = provider
    .read(entry)
    .map_err(|err| Error::io(entry, err))?;

  let mut units = BTreeMap::new();
  let mut visited = BTreeSet::from([entry.to_string()]);
  let mut pending = vec![SourceUnit {
    logical_path: entry.to_string(),
    content,
  }];

  while let Some(unit) = pending.pop() {
    for import in parse_imports(&unit.content) {
      let logical = provider.resolve_import(&unit.logical_path, &import);
      if !visited.insert(logical.clone()) {
        continue;
      }
      let content = provider
        .read(&logical)
        .map_err(|_| Error::ImportNotFound {
          import: import.clone(),
          importer: unit.logical_path.clone(),
        })?;
      tracing::trace!(import = %logical, importer = %unit.logical_path, "resolved import");
      pending.push(SourceUnit {
        logical_path: logical,
        content,
      });
    }
    units.insert(unit.logical_path.clone(), unit);
  }

  tracing::debug!(entry, count = units.len(), "resolved sources");
  Ok(SourceSet {
    entry: entry.to_string(),
    units,
  })
}
