use std::path::Path;

use image::{imageops::FilterType, ImageBuffer, ImageFormat, Rgb, RgbImage};
use tracing::{debug, instrument};

use crate::{
    colormap::{viridis, Normalize},
    decode_file, power_to_db, MelFilterbank, ProcessError, SpectrogramConfig,
    SpectrogramGenerator,
};

/// Pixel size of the written spectrogram images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 360,
            height: 200,
        }
    }
}

impl ImageConfig {
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProcessError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramSummary {
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub frames: usize,
    pub n_mels: usize,
}

/// Colours a frame-major dB spectrogram, lowest band on the bottom row.
pub fn db_to_image(db: &[Vec<f32>]) -> RgbImage {
    let width = db.len() as u32;
    let height = db.first().map_or(0, Vec::len) as u32;
    let norm = Normalize::from_values(db.iter().flatten());

    ImageBuffer::from_fn(width, height, |x, y| {
        let band = (height - 1 - y) as usize;
        db[x as usize]
            .get(band)
            .map_or(Rgb([0, 0, 0]), |value| viridis(norm.apply(*value)))
    })
}

/// Decodes `input`, draws its mel spectrogram and writes it as PNG to `output`.
#[instrument(skip(generator, config, image_config), level = "debug")]
pub fn render_spectrogram_file(
    input: &Path,
    output: &Path,
    generator: &SpectrogramGenerator<f32>,
    config: &SpectrogramConfig,
    image_config: &ImageConfig,
) -> Result<SpectrogramSummary, ProcessError> {
    config.validate()?;
    image_config.validate()?;

    let audio = decode_file(input)?;
    let filterbank = MelFilterbank::new(audio.sample_rate, config)?;

    let start = std::time::Instant::now();
    let power = generator.run(&audio.samples, config);
    let mel = filterbank.apply(&power);
    let db = power_to_db(&mel, config.top_db);
    let elapsed = start.elapsed();
    debug!(?elapsed, frames = db.len(), "spectrogram generated");

    let canvas = db_to_image(&db);
    let resized = image::imageops::resize(
        &canvas,
        image_config.width,
        image_config.height,
        FilterType::Triangle,
    );

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    resized.save_with_format(output, ImageFormat::Png)?;

    Ok(SpectrogramSummary {
        sample_rate: audio.sample_rate,
        duration_secs: audio.duration_secs(),
        frames: db.len(),
        n_mels: filterbank.n_mels(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_bands_are_drawn_at_the_bottom() {
        // one frame, loud lowest band
        let db = vec![vec![0.0, -80.0, -80.0]];
        let img = db_to_image(&db);
        assert_eq!(img.dimensions(), (1, 3));
        assert_eq!(*img.get_pixel(0, 2), viridis(1.0));
        assert_eq!(*img.get_pixel(0, 0), viridis(0.0));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let image = ImageConfig { width: 0, height: 200 };
        assert!(image.validate().is_err());
        assert!(ImageConfig::default().validate().is_ok());
    }
}
