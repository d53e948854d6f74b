use std::path::Path;

use tracing::{debug, instrument};

use crate::{Catalog, CatalogError};

impl Catalog {
    /// Reads a pretty or compact JSON manifest.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|source| CatalogError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(n_examples = catalog.examples.len(), "loaded manifest");
        Ok(catalog)
    }

    #[instrument(skip(self), level = "debug")]
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content).map_err(|source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{AssetRef, Example, Method, SampleEntry};

    use super::*;

    #[test]
    fn saved_manifest_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let catalog = Catalog {
            title: "Demo".into(),
            description: String::new(),
            code_url: Some("https://example.org/code".into()),
            examples: vec![Example {
                id: "051o0211".into(),
                entries: vec![SampleEntry {
                    method: Method::VpvidOde,
                    audio: AssetRef::new("input_wsj0c3/vpvid_ode/051o0211.wav"),
                    spectrogram: AssetRef::new("spectrograms/vpvid_ode/051o0211.png"),
                }],
            }],
        };

        catalog.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"VPVID-ODE\""));
        assert_eq!(Catalog::load(&path).unwrap(), catalog);
    }

    #[test]
    fn malformed_manifest_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"title": "x", "examples": [{"id": "a", "entries": [{"method": "Wiener"}]}]}"#).unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Manifest { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
