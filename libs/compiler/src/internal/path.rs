use std::path::{Component, Path, PathBuf};

/// Canonicalises a path while falling back to an absolute join if canonicalisation fails.
pub fn canonicalize_path(path: &Path) -> PathBuf {
  match std::fs::canonicalize(path) {
    Ok(canonical) => canonical,
    Err(_) => {
      if path.is_absolute() {
        path.to_path_buf()
      } else {
        std::env::current_dir()
          .unwrap_or_else(|_| PathBuf::from("."))
          .join(path)
      }
    }
  }
}

/// Resolves an import the way solc names source units: `./` and `../` imports are
/// joined onto the importer's directory, everything else is taken verbatim.
pub fn resolve_logical_import(importer: &str, import: &str) -> String {
  if import.starts_with("./") || import.starts_with("../") {
    let dir = match importer.rfind('/') {
      Some(index) => &importer[..index],
      None => "",
    };
    if dir.is_empty() {
      normalize_logical(import)
    } else {
      normalize_logical(&format!("{dir}/{import}"))
    }
  } else {
    normalize_logical(import)
  }
}

/// Collapses `.` and `..` segments of a `/`-separated logical path. Leading `..`
/// segments that cannot be collapsed are kept.
pub fn normalize_logical(path: &str) -> String {
  let absolute = path.starts_with('/');
  let mut segments: Vec<&str> = Vec::new();
  for segment in path.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        if matches!(segments.last(), Some(last) if *last != "..") {
          segments.pop();
        } else if !absolute {
          segments.push("..");
        }
      }
      other => segments.push(other),
    }
  }
  let joined = segments.join("/");
  if absolute {
    format!("/{joined}")
  } else {
    joined
  }
}

/// Converts a filesystem path below `base` into a `/`-separated logical path.
pub fn to_logical(base: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(base).unwrap_or(path);
  let parts: Vec<String> = relative
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      Component::ParentDir => Some("..".to_string()),
      _ => None,
    })
    .collect();
  parts.join("/")
}
