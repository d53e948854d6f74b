//! Mel filterbank on the Slaney scale with Slaney area normalisation.

use tracing::warn;

use crate::{Float, ProcessError, SpectrogramConfig};

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;
// ln(6.4) / 27
const LOGSTEP: f32 = 0.068_751_74;

/// Linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz < MIN_LOG_HZ {
        hz / F_SP
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / LOGSTEP
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * ((mel - MIN_LOG_MEL) * LOGSTEP).exp()
    }
}

#[derive(Debug, Clone)]
pub struct MelFilterbank {
    /// `n_mels` rows of `fft_len / 2 + 1` weights.
    filters: Vec<Vec<f32>>,
    fmax: f32,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, config: &SpectrogramConfig) -> Result<Self, ProcessError> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(ProcessError::InvalidConfig("sample rate must be non-zero".into()));
        }

        let nyquist = sample_rate as f32 / 2.0;
        let fmax = match config.fmax {
            Some(fmax) if fmax > nyquist => {
                warn!(fmax, nyquist, "fmax above nyquist, clamping");
                nyquist
            }
            Some(fmax) => fmax,
            None => nyquist,
        };
        if fmax <= config.fmin {
            return Err(ProcessError::InvalidConfig(format!(
                "fmin ({}) must be below the effective fmax ({fmax})",
                config.fmin
            )));
        }

        let n_freqs = config.fft_len / 2 + 1;
        let n_mels = config.n_mels;

        let mel_min = hz_to_mel(config.fmin);
        let mel_max = hz_to_mel(fmax);
        let hz_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32)
            .map(mel_to_hz)
            .collect();
        let fft_freqs: Vec<f32> = (0..n_freqs)
            .map(|i| i as f32 * sample_rate as f32 / config.fft_len as f32)
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
                let enorm = 2.0 / (upper - lower);
                fft_freqs
                    .iter()
                    .map(|&freq| {
                        let rising = (freq - lower) / (center - lower);
                        let falling = (upper - freq) / (upper - center);
                        rising.min(falling).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();

        Ok(Self { filters, fmax })
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Upper band edge actually used, after clamping to nyquist.
    pub fn fmax(&self) -> f32 {
        self.fmax
    }

    /// Projects power frames onto the mel bands, frame-major like the input.
    pub fn apply<T: Float>(&self, frames: &[Vec<T>]) -> Vec<Vec<f32>> {
        frames
            .iter()
            .map(|frame| {
                self.filters
                    .iter()
                    .map(|filter| {
                        filter
                            .iter()
                            .zip(frame)
                            .map(|(w, p)| w * p.to_f32().unwrap_or(0.0))
                            .sum::<f32>()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_mels: usize, fmax: Option<f32>) -> SpectrogramConfig {
        SpectrogramConfig {
            fft_len: 512,
            hop_len: 128,
            n_mels,
            fmin: 0.0,
            fmax,
            top_db: Some(80.0),
        }
    }

    #[test]
    fn mel_scale_round_trips_and_breaks_at_1khz() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-4);
        for hz in [0.0, 200.0, 999.0, 1000.0, 4000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.05, "{hz}");
        }
    }

    #[test]
    fn filter_shape() {
        let bank = MelFilterbank::new(16_000, &config(40, Some(8000.0))).unwrap();
        assert_eq!(bank.n_mels(), 40);
        assert!(bank.filters.iter().all(|f| f.len() == 257));
        assert!(bank.filters.iter().flatten().all(|w| *w >= 0.0));
        // every band catches at least one bin at this resolution
        assert!(bank.filters.iter().all(|f| f.iter().any(|w| *w > 0.0)));
    }

    #[test]
    fn fmax_is_clamped_to_nyquist() {
        let bank = MelFilterbank::new(8_000, &config(32, Some(8000.0))).unwrap();
        assert_eq!(bank.fmax(), 4000.0);
        let bank = MelFilterbank::new(8_000, &config(32, None)).unwrap();
        assert_eq!(bank.fmax(), 4000.0);
    }

    #[test]
    fn fmin_above_clamped_fmax_is_rejected() {
        let mut cfg = config(32, Some(8000.0));
        cfg.fmin = 5000.0;
        assert!(MelFilterbank::new(8_000, &cfg).is_err());
        assert!(MelFilterbank::new(0, &config(32, None)).is_err());
    }

    #[test]
    fn single_bin_lands_in_matching_band() {
        let bank = MelFilterbank::new(16_000, &config(40, Some(8000.0))).unwrap();
        // bin 64 = 2 kHz
        let mut frame = vec![0.0f32; 257];
        frame[64] = 1.0;
        let mel = bank.apply(&[frame]);
        let peak = mel[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let band_center = mel_to_hz(
            hz_to_mel(0.0) + (hz_to_mel(8000.0) - hz_to_mel(0.0)) * (peak + 1) as f32 / 41.0,
        );
        assert!((band_center - 2000.0).abs() < 250.0, "band centre {band_center}");
    }
}
