use ripple_core::{EntityDescriptor, SourceParser};
use std::path::Path;
use tracing::info;
use walkdir::{DirEntry, WalkDir};

// The walk root itself is exempt so a hidden-named checkout directory
// still gets scanned.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Walks `root` and parses every file the parser claims, skipping hidden
/// directories such as `.git`. Unreadable files contribute nothing.
pub fn parse_repo(parser: &dyn SourceParser, root: &Path) -> Vec<EntityDescriptor> {
    let mut descriptors = Vec::new();
    let mut files = 0usize;
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
    {
        if entry.file_type().is_file() && parser.handles(entry.path()) {
            descriptors.extend(parser.parse_file(entry.path()));
            files += 1;
        }
    }
    info!(
        root = %root.display(),
        files,
        entities = descriptors.len(),
        "parsed source tree"
    );
    descriptors
}
