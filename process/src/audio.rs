use std::path::Path;

use symphonia::core::{
    audio::{AudioBuffer, Signal},
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, instrument, trace, warn};

use crate::ProcessError;

/// Audio downmixed to a single channel at its native sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before downmixing.
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[instrument(level = "trace")]
pub fn decode_file(filename: &Path) -> Result<DecodedAudio, ProcessError> {
    debug!("opening file");
    let file = std::fs::File::open(filename).map_err(|source| ProcessError::Open {
        path: filename.to_path_buf(),
        source,
    })?;
    let stream = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = filename.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let mut probed = symphonia::default::get_probe().format(
        &hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let format = &mut probed.format;

    let tracks = format.tracks();
    if tracks.len() != 1 {
        warn!(n_tracks = tracks.len(), "file has several tracks, using the first audio track");
    }
    let track = tracks
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(ProcessError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    debug!(params = ?track.codec_params, "read codec params");

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(reason, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        sample_rate = decoded.spec().rate;

        let mut converted: AudioBuffer<f32> =
            AudioBuffer::new(decoded.frames() as u64, decoded.spec().to_owned());
        decoded.convert(&mut converted);
        let planes = converted.planes();
        let planes_slice = planes.planes();
        if channels.len() != planes_slice.len() {
            trace!("resizing channels due to size mismatch");
            channels.resize_with(planes_slice.len(), Vec::new);
        }
        channels
            .iter_mut()
            .zip(planes_slice)
            .for_each(|(d, v)| d.extend_from_slice(v));
    }

    if sample_rate == 0 {
        return Err(ProcessError::NoTrack);
    }

    let n_channels = channels.len();
    let samples = downmix(channels);
    debug!(n_samples = samples.len(), sample_rate, n_channels, "decoded audio");

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: n_channels,
    })
}

/// Averages all channels into one.
fn downmix(mut channels: Vec<Vec<f32>>) -> Vec<f32> {
    match channels.len() {
        0 => Vec::new(),
        1 => channels.swap_remove(0),
        n => {
            let len = channels.iter().map(Vec::len).min().unwrap_or(0);
            (0..len)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() / n as f32)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix(vec![vec![1.0, 0.5, -1.0], vec![0.0, 0.5, 1.0]]);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_passes_mono_through() {
        assert_eq!(downmix(vec![vec![0.25, -0.25]]), vec![0.25, -0.25]);
        assert!(downmix(Vec::new()).is_empty());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = decode_file(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, ProcessError::Open { .. }));
    }
}
