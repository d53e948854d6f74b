use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use tracing::{debug, info, instrument, warn};

use crate::{AssetRef, Catalog, CatalogError, Example, Method, SampleEntry};

/// Where audio and spectrograms live, relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub audio_dir: String,
    pub spectrogram_dir: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            audio_dir: "input_wsj0c3".to_string(),
            spectrogram_dir: "spectrograms".to_string(),
        }
    }
}

impl AssetLayout {
    pub fn audio_ref(&self, method: Method, id: &str) -> AssetRef {
        asset_ref(&self.audio_dir, method, &format!("{id}.wav"))
    }

    pub fn spectrogram_ref(&self, method: Method, id: &str) -> AssetRef {
        asset_ref(&self.spectrogram_dir, method, &format!("{id}.png"))
    }
}

/// Joins `dir/slug/file` as a URL path, percent-encoding every segment.
fn asset_ref(dir: &str, method: Method, file: &str) -> AssetRef {
    let segments = dir
        .split('/')
        .filter(|s| !s.is_empty())
        .chain([method.slug(), file])
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>();
    AssetRef::new(segments.join("/"))
}

impl Catalog {
    /// Builds a catalog from `<site_root>/<audio_dir>/<slug>/*.wav`.
    ///
    /// Example ids are the union of file stems across methods, sorted.
    /// Missing entries are left out; [`Catalog::validate`] reports them.
    #[instrument(skip(title, description, code_url), level = "debug")]
    pub fn discover(
        site_root: &Path,
        layout: &AssetLayout,
        title: &str,
        description: &str,
        code_url: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let audio_root = site_root.join(&layout.audio_dir);
        if !audio_root.is_dir() {
            return Err(CatalogError::MissingAudioDir(audio_root));
        }

        let mut found: BTreeMap<String, BTreeSet<Method>> = BTreeMap::new();
        for method in Method::ALL {
            let method_dir = audio_root.join(method.slug());
            if !method_dir.is_dir() {
                warn!(?method_dir, %method, "method directory not found, skipping");
                continue;
            }

            let ids = wav_stems(&method_dir)?;
            debug!(%method, n_files = ids.len(), "scanned method directory");
            for id in ids {
                found.entry(id).or_default().insert(method);
            }
        }

        let examples: Vec<Example> = found
            .into_iter()
            .map(|(id, methods)| Example {
                entries: methods
                    .into_iter()
                    .map(|method| SampleEntry {
                        method,
                        audio: layout.audio_ref(method, &id),
                        spectrogram: layout.spectrogram_ref(method, &id),
                    })
                    .collect(),
                id,
            })
            .collect();
        info!(n_examples = examples.len(), "discovered examples");

        Ok(Catalog {
            title: title.to_string(),
            description: description.to_string(),
            code_url: code_url.map(str::to_string),
            examples,
        })
    }
}

/// Sorted stems of the `.wav` files directly inside `dir`.
///
/// The extension match is case-sensitive, so the stem always maps back to
/// `<stem>.wav`.
pub fn wav_stems(dir: &Path) -> Result<Vec<String>, CatalogError> {
    let read_err = |source: std::io::Error| CatalogError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "wav");
        if !is_wav || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        } else {
            warn!(?path, "skipping file with non UTF-8 name");
        }
    }
    stems.sort();
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_follow_the_layout() {
        let layout = AssetLayout {
            audio_dir: "audio/".into(),
            spectrogram_dir: "img".into(),
        };
        assert_eq!(
            layout.audio_ref(Method::VpvidPc, "051o0211").as_str(),
            "audio/vpvid_sdec/051o0211.wav"
        );
        assert_eq!(
            layout.spectrogram_ref(Method::Clean, "051o0211").as_str(),
            "img/clean/051o0211.png"
        );
    }

    #[test]
    fn refs_percent_encode_each_segment() {
        let layout = AssetLayout {
            audio_dir: "my audio/wsj0".into(),
            spectrogram_dir: "spectrograms".into(),
        };
        let audio = layout.audio_ref(Method::Clean, "take#2");
        assert_eq!(audio.as_str(), "my%20audio/wsj0/clean/take%232.wav");
        assert_eq!(
            audio.local_path().unwrap(),
            Path::new("my audio").join("wsj0").join("clean").join("take#2.wav")
        );
        assert_eq!(
            layout.spectrogram_ref(Method::Noisy, "a?b").as_str(),
            "spectrograms/noisy/a%3Fb.png"
        );
    }

    #[test]
    fn only_lowercase_wav_extension_is_listed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["quiet.wav", "LOUD.WAV", "Mixed.Wav", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.wav")).unwrap();

        assert_eq!(wav_stems(dir.path()).unwrap(), vec!["quiet".to_string()]);
    }
}
