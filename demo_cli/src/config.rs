use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Site configuration, read from an optional JSON file.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub code_url: Option<String>,

    // Layout, relative to the site root
    pub audio_dir: String,
    pub spectrogram_dir: String,
    pub output: PathBuf,

    pub spectrogram: SpectrogramSettings,
    pub check: CheckSettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "VPVID: speech enhancement samples".to_string(),
            description: "Audio samples and mel spectrograms on WSJ0-CHiME3, \
                          comparing the proposed VPVID samplers with diffusion and flow baselines."
                .to_string(),
            code_url: None,
            audio_dir: "input_wsj0c3".to_string(),
            spectrogram_dir: "spectrograms".to_string(),
            output: PathBuf::from("index.html"),
            spectrogram: SpectrogramSettings::default(),
            check: CheckSettings::default(),
        }
    }
}

impl SiteConfig {
    /// Load config from file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load the given config file, or use the defaults when none was given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn layout(&self) -> catalog::AssetLayout {
        catalog::AssetLayout {
            audio_dir: self.audio_dir.clone(),
            spectrogram_dir: self.spectrogram_dir.clone(),
        }
    }

    pub fn page_options(&self) -> catalog::PageOptions {
        catalog::PageOptions {
            image_width: self.spectrogram.width,
            image_height: self.spectrogram.height,
        }
    }
}

/// Spectrogram drawing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramSettings {
    pub fft_len: usize,
    pub hop_len: usize,
    pub n_mels: usize,
    pub fmin: f32,
    pub fmax: Option<f32>,
    pub top_db: Option<f32>,
    pub width: u32,
    pub height: u32,
}

impl Default for SpectrogramSettings {
    fn default() -> Self {
        let dsp = process::SpectrogramConfig::default();
        let image = process::ImageConfig::default();
        Self {
            fft_len: dsp.fft_len,
            hop_len: dsp.hop_len,
            n_mels: dsp.n_mels,
            fmin: dsp.fmin,
            fmax: dsp.fmax,
            top_db: dsp.top_db,
            width: image.width,
            height: image.height,
        }
    }
}

impl SpectrogramSettings {
    pub fn spectrogram_config(&self) -> process::SpectrogramConfig {
        process::SpectrogramConfig {
            fft_len: self.fft_len,
            hop_len: self.hop_len,
            n_mels: self.n_mels,
            fmin: self.fmin,
            fmax: self.fmax,
            top_db: self.top_db,
        }
    }

    pub fn image_config(&self) -> process::ImageConfig {
        process::ImageConfig {
            width: self.width,
            height: self.height,
        }
    }
}

/// Asset check tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            concurrency: catalog::AssetChecker::DEFAULT_CONCURRENCY,
            timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.audio_dir, "input_wsj0c3");
        assert_eq!(config.spectrogram.width, 360);
        assert_eq!(config.spectrogram.height, 200);
        assert_eq!(config.spectrogram.fmax, Some(8000.0));
        assert_eq!(config.spectrogram.n_mels, 128);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(
            &path,
            r#"{"title": "Mine", "spectrogram": {"n_mels": 64}, "code_url": "https://example.org"}"#,
        )
        .unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "Mine");
        assert_eq!(config.code_url.as_deref(), Some("https://example.org"));
        assert_eq!(config.spectrogram.n_mels, 64);
        assert_eq!(config.spectrogram.fft_len, 2048);
        assert_eq!(config.spectrogram_dir, "spectrograms");
    }

    #[test]
    fn test_no_file_given_is_default() {
        let config = SiteConfig::load_or_default(None).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = SiteConfig::load_or_default(Some(Path::new("/no/such/demo.json"))).unwrap_err();
        assert!(err.to_string().contains("/no/such/demo.json"), "{err}");
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SiteConfig::load(&path).is_err());
    }
}
