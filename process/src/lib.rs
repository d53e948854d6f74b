use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use rustfft::{FftNum, FftPlanner};
use tracing::instrument;

pub mod audio;
pub mod colormap;
mod error;
pub mod mel;
pub mod render;
pub mod scale;

pub use audio::{decode_file, DecodedAudio};
pub use error::ProcessError;
pub use mel::MelFilterbank;
pub use render::{render_spectrogram_file, ImageConfig, SpectrogramSummary};
pub use scale::power_to_db;

pub trait Float: FftNum + num_traits::Float {}
impl Float for f32 {}
impl Float for f64 {}

/// Short-time power spectrum with cached FFT plans and Hann windows.
///
/// Cloning is cheap and clones share the caches, so a single generator can
/// be handed to every worker of a batch.
#[derive(Clone)]
pub struct SpectrogramGenerator<T: Float> {
    planner: Arc<Mutex<FftPlanner<T>>>,
    hanns: Arc<RwLock<HashMap<usize, Arc<Vec<f32>>>>>,
}

impl<T: Float> Default for SpectrogramGenerator<T> {
    fn default() -> Self {
        Self {
            planner: Arc::new(Mutex::new(FftPlanner::new())),
            hanns: Default::default(),
        }
    }
}

impl<T: Float> SpectrogramGenerator<T> {
    /// Returns one frame per hop, each holding `fft_len / 2 + 1` power bins.
    ///
    /// Frames are centred: the signal is zero padded by `fft_len / 2` on
    /// both ends, so there are `1 + samples.len() / hop_len` frames.
    #[instrument(skip(self, samples), fields(n_samples = samples.len()), level = "trace")]
    pub fn run(&self, samples: &[f32], config: &SpectrogramConfig) -> Vec<Vec<T>> {
        let mut planner_guard = self.planner.lock().unwrap_or_else(PoisonError::into_inner);
        let fft = planner_guard.plan_fft_forward(config.fft_len);
        drop(planner_guard);
        let hann = self.get_hann(config.fft_len);
        let hann_slice = hann.as_slice();

        let pad = config.fft_len / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        padded
            .windows(config.fft_len)
            .step_by(config.hop_len)
            .map(|window| {
                window
                    .iter()
                    .zip(hann_slice)
                    .map(|(sample, hann)| sample * hann)
                    .map(|scaled| {
                        num_complex::Complex::new(T::from_f32(scaled).unwrap_or_else(T::zero), T::zero())
                    })
                    .collect::<Vec<_>>()
            })
            .map(|mut window| {
                fft.process(window.as_mut_slice());
                window
            })
            .map(|complex| {
                complex
                    .into_iter()
                    // real input: bins above nyquist mirror the lower half
                    .take(config.fft_len / 2 + 1)
                    .map(|val| val.norm_sqr())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn get_hann(&self, size: usize) -> Arc<Vec<f32>> {
        let read = self.hanns.read().unwrap_or_else(PoisonError::into_inner);

        match read.get(&size) {
            Some(hann) => hann.clone(),
            None => {
                drop(read);
                self.generate_hann(size)
            }
        }
    }

    #[instrument(skip(self), level = "trace")]
    fn generate_hann(&self, size: usize) -> Arc<Vec<f32>> {
        let hann = Arc::new(generate_hanning_window(size));
        let mut write = self.hanns.write().unwrap_or_else(PoisonError::into_inner);
        write.entry(size).or_insert(hann).clone()
    }
}

/// Parameters of the mel spectrogram drawn for every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramConfig {
    pub fft_len: usize,
    pub hop_len: usize,
    pub n_mels: usize,
    pub fmin: f32,
    /// Upper edge of the mel bands, `None` for nyquist.
    pub fmax: Option<f32>,
    /// Dynamic range kept below the peak, `None` keeps everything.
    pub top_db: Option<f32>,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            fft_len: 2048,
            hop_len: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: Some(8000.0),
            top_db: Some(80.0),
        }
    }
}

impl SpectrogramConfig {
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.fft_len < 2 {
            return Err(ProcessError::InvalidConfig(format!(
                "fft_len must be at least 2, got {}",
                self.fft_len
            )));
        }
        if self.hop_len == 0 {
            return Err(ProcessError::InvalidConfig("hop_len must be non-zero".into()));
        }
        if self.n_mels == 0 {
            return Err(ProcessError::InvalidConfig("n_mels must be non-zero".into()));
        }
        if self.fmin < 0.0 {
            return Err(ProcessError::InvalidConfig(format!("fmin must be >= 0, got {}", self.fmin)));
        }
        if let Some(fmax) = self.fmax {
            if fmax <= self.fmin {
                return Err(ProcessError::InvalidConfig(format!(
                    "fmax ({fmax}) must be above fmin ({})",
                    self.fmin
                )));
            }
        }
        if let Some(top_db) = self.top_db {
            if top_db < 0.0 {
                return Err(ProcessError::InvalidConfig(format!("top_db must be >= 0, got {top_db}")));
            }
        }
        Ok(())
    }
}

/// Periodic Hann window, the variant used for spectral analysis.
fn generate_hanning_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * (i as f32 / size as f32)).cos()))
        .collect()
}
