//! Static dashboard assets, read once at startup and served from memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const TEMPLATE_FILE: &str = "dashboard_template.html";
pub const CSS_FILE: &str = "dashboard.css";
pub const JS_FILE: &str = "dashboard.js";

#[derive(Error, Debug)]
#[error("cannot read dashboard asset {path}: {source}")]
pub struct AssetError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardAssets {
    pub template: String,
    pub css: String,
    pub js: String,
}

impl DashboardAssets {
    /// Load the template, stylesheet and script from `dir`.
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|source| AssetError { path, source })
        };
        Ok(Self {
            template: read(TEMPLATE_FILE)?,
            css: read(CSS_FILE)?,
            js: read(JS_FILE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_assets_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let assets = DashboardAssets::load(&dir).unwrap();
        assert!(assets.template.contains("__VIEW_MODE__"));
        assert!(assets.template.contains("{{linked_table_rows}}"));
        assert!(!assets.css.is_empty());
        assert!(assets.js.contains("/api/link"));
    }

    #[test]
    fn test_missing_dir_names_the_file() {
        let err = DashboardAssets::load(Path::new("/nonexistent-assets")).unwrap_err();
        assert!(err.path.ends_with(TEMPLATE_FILE));
    }
}
