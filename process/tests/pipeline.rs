use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use process::{
    decode_file, render_spectrogram_file, ImageConfig, MelFilterbank, ProcessError,
    SpectrogramConfig, SpectrogramGenerator,
};

fn write_tone(path: &Path, freq: f32, sample_rate: u32, channels: u16, secs: f32) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let frames = (sample_rate as f32 * secs) as usize;
    for i in 0..frames {
        let value = 0.5 * (std::f32::consts::TAU * freq * i as f32 / sample_rate as f32).sin();
        for _ in 0..channels {
            writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn decodes_stereo_wav_to_mono() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    write_tone(&wav, 440.0, 16_000, 2, 0.5);

    let audio = decode_file(&wav).unwrap();
    assert_eq!(audio.sample_rate, 16_000);
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.samples.len(), 8_000);
    assert!((audio.duration_secs() - 0.5).abs() < 1e-9);
    let peak = audio.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - 0.5).abs() < 0.01, "peak {peak}");
}

#[test]
fn renders_png_of_configured_size() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("in.wav");
    let png = dir.path().join("out").join("clean").join("in.png");
    write_tone(&wav, 1000.0, 16_000, 1, 1.0);

    let summary = render_spectrogram_file(
        &wav,
        &png,
        &SpectrogramGenerator::default(),
        &SpectrogramConfig::default(),
        &ImageConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.sample_rate, 16_000);
    assert_eq!(summary.frames, 1 + 16_000 / 512);
    assert_eq!(summary.n_mels, 128);

    let written = image::open(&png).unwrap();
    assert_eq!((written.width(), written.height()), (360, 200));
}

#[test]
fn tone_energy_sits_in_its_mel_band() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    write_tone(&wav, 2000.0, 16_000, 1, 1.0);

    let config = SpectrogramConfig::default();
    let audio = decode_file(&wav).unwrap();
    let bank = MelFilterbank::new(audio.sample_rate, &config).unwrap();
    let power = SpectrogramGenerator::<f32>::default().run(&audio.samples, &config);
    let mel = bank.apply(&power);
    let frame = &mel[mel.len() / 2];
    let peak = frame
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();

    let band_hz = process::mel::mel_to_hz(
        process::mel::hz_to_mel(8000.0) * (peak + 1) as f32 / (config.n_mels + 1) as f32,
    );
    assert!((band_hz - 2000.0).abs() < 100.0, "peak band centred at {band_hz} Hz");
}

#[test]
fn empty_wav_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("empty.wav");
    let png = dir.path().join("empty.png");
    write_tone(&wav, 440.0, 16_000, 1, 0.0);

    let summary = render_spectrogram_file(
        &wav,
        &png,
        &SpectrogramGenerator::default(),
        &SpectrogramConfig::default(),
        &ImageConfig { width: 36, height: 20 },
    )
    .unwrap();
    assert_eq!(summary.frames, 1);
    assert!(png.exists());
}

#[test]
fn garbage_input_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("broken.wav");
    std::fs::write(&wav, b"definitely not a riff file").unwrap();

    let err = render_spectrogram_file(
        &wav,
        &dir.path().join("broken.png"),
        &SpectrogramGenerator::default(),
        &SpectrogramConfig::default(),
        &ImageConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ProcessError::Decode(_)), "{err}");
}
