use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use catalog::Method;
use futures::{stream, StreamExt};
use tracing::{error, info, instrument, warn};

use crate::config::SpectrogramSettings;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub generated: usize,
    pub failed: Vec<(PathBuf, String)>,
}

/// Draws `<out_root>/<slug>/<id>.png` for every `<audio_root>/<slug>/<id>.wav`.
///
/// Individual failures are logged and collected; the batch always runs to
/// the end.
#[instrument(skip(settings), level = "debug")]
pub async fn generate_all(
    audio_root: &Path,
    out_root: &Path,
    settings: &SpectrogramSettings,
    jobs: usize,
) -> Result<BatchReport> {
    if !audio_root.is_dir() {
        bail!("input directory {} not found", audio_root.display());
    }

    let spectrogram_config = settings.spectrogram_config();
    let image_config = settings.image_config();
    spectrogram_config.validate()?;
    image_config.validate()?;

    std::fs::create_dir_all(out_root)
        .with_context(|| format!("failed to create {}", out_root.display()))?;

    let mut work = Vec::new();
    for method in Method::ALL {
        let method_dir = audio_root.join(method.slug());
        if !method_dir.is_dir() {
            warn!(%method, ?method_dir, "method directory not found, skipping");
            continue;
        }

        let out_dir = out_root.join(method.slug());
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;

        let stems = catalog::discover::wav_stems(&method_dir)?;
        info!(%method, n_files = stems.len(), "queueing method");
        work.extend(stems.into_iter().map(|stem| {
            (
                method_dir.join(format!("{stem}.wav")),
                out_dir.join(format!("{stem}.png")),
            )
        }));
    }

    let mut report = BatchReport {
        total: work.len(),
        ..Default::default()
    };
    info!(
        total = report.total,
        width = image_config.width,
        height = image_config.height,
        "generating spectrograms"
    );

    let generator = process::SpectrogramGenerator::<f32>::default();
    let mut results = stream::iter(work)
        .map(|(input, output)| {
            let generator = generator.clone();
            let spectrogram_config = spectrogram_config.clone();
            let task_input = input.clone();
            let task = tokio::task::spawn_blocking(move || {
                process::render_spectrogram_file(
                    &task_input,
                    &output,
                    &generator,
                    &spectrogram_config,
                    &image_config,
                )
                .map(|summary| (output, summary))
            });
            async move { (input, task.await) }
        })
        .buffer_unordered(jobs.max(1));

    while let Some((input, joined)) = results.next().await {
        match joined {
            Ok(Ok((output, summary))) => {
                report.generated += 1;
                info!(?output, duration_secs = summary.duration_secs, "generated");
            }
            Ok(Err(e)) => {
                error!(?input, error = %e, "failed to process");
                report.failed.push((input, e.to_string()));
            }
            Err(e) => {
                error!(?input, error = %e, "spectrogram task panicked");
                report.failed.push((input, e.to_string()));
            }
        }
    }

    Ok(report)
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
