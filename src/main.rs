// Batch runner: denoises every image in a dataset directory with both engines,
// saves the grayscale inputs and both outputs, prints the timing table and draws
// the timing chart.
//
// Decoding and encoding are I/O-bound and run concurrently on tokio's blocking
// pool. The benchmarks themselves run strictly one image at a time so that the
// timings of different images never overlap.

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use median_vision::chart::write_chart;
use median_vision::core_modules::intensity_buffer::intensity_buffer::IntensityBuffer;
use median_vision::core_modules::utils::image_helper::image_helper;
use median_vision::pipeline::{BenchmarkHarness, DEFAULT_CHUNK_SIZE, DEFAULT_RADIUS, FilterConfig};
use median_vision::report::render_table;
use std::env;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];
const NOISY_DIR: &str = "dataset-w-noise";
const OUTPUT_DIR: &str = "dataset-output";
const CHART_FILE: &str = "performance_comparison.png";

struct LoadedImage {
    name: String,
    buffer: IntensityBuffer,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: median_vision <dataset_dir> [output_dir] [chunk_size|auto] [radius]");
        return Ok(());
    }
    let dataset_dir = PathBuf::from(&args[1]);
    let output_root = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let chunk_arg = args.get(3).map(String::as_str);
    let radius: i64 = match args.get(4) {
        Some(raw) => raw.parse().with_context(|| format!("radius must be an integer, got {raw:?}"))?,
        None => DEFAULT_RADIUS as i64,
    };

    // --- 2. Dataset Discovery ---
    let paths = list_images(&dataset_dir)?;
    if paths.is_empty() {
        bail!("no images found in {}", dataset_dir.display());
    }
    println!("Running Median Filter on {} images, please wait...", paths.len());

    // --- 3. Concurrent Decode ---
    let loads = paths.into_iter().map(|path| {
        tokio::task::spawn_blocking(move || {
            let result = image_helper::load_grayscale(&path);
            (path, result)
        })
    });
    let mut images = Vec::new();
    for joined in join_all(loads).await {
        let (path, result) = joined.context("decode task panicked")?;
        match result {
            Ok(buffer) => images.push(LoadedImage {
                name: file_stem(&path),
                buffer,
            }),
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }
    let Some(first) = images.first() else {
        bail!("none of the images in {} could be decoded", dataset_dir.display());
    };

    // --- 4. Configuration ---
    let config = match chunk_arg {
        Some("auto") => {
            let auto = FilterConfig::for_available_cores(first.buffer.width(), first.buffer.height());
            FilterConfig::from_signed(radius, auto.chunk_size as i64)?
        }
        Some(raw) => {
            let chunk_size: i64 = raw
                .parse()
                .with_context(|| format!("chunk size must be an integer or \"auto\", got {raw:?}"))?;
            FilterConfig::from_signed(radius, chunk_size)?
        }
        None => FilterConfig::from_signed(radius, DEFAULT_CHUNK_SIZE as i64)?,
    };
    log::info!(
        "radius {}, chunk size {} px, {} cores available",
        config.radius,
        config.chunk_size,
        num_cpus::get()
    );

    // --- 5. Benchmark, one image at a time ---
    let noisy_dir = output_root.join(NOISY_DIR);
    let output_dir = output_root.join(OUTPUT_DIR);
    let (harness, writes) = tokio::task::spawn_blocking(move || {
        run_benchmarks(config, images, &noisy_dir, &output_dir)
    })
    .await
    .context("benchmark task panicked")??;

    // --- 6. Concurrent Save ---
    let saves = writes.into_iter().map(|(path, buffer)| {
        tokio::task::spawn_blocking(move || {
            image_helper::save(&path, buffer).with_context(|| format!("failed to save {}", path.display()))
        })
    });
    for joined in join_all(saves).await {
        joined.context("save task panicked")??;
    }

    // --- 7. Report ---
    print!("{}", render_table(harness.records()));
    if harness.records().is_empty() {
        log::warn!("no image was benchmarked, skipping the chart");
    } else {
        let chart_path = output_root.join(CHART_FILE);
        write_chart(harness.records(), &chart_path)
            .with_context(|| format!("failed to draw {}", chart_path.display()))?;
        println!("Chart saved to {}", chart_path.display());
    }
    Ok(())
}

/// Benchmarks every image and collects the files to write. A filter error skips
/// that image only.
fn run_benchmarks(
    config: FilterConfig,
    images: Vec<LoadedImage>,
    noisy_dir: &Path,
    output_dir: &Path,
) -> Result<(BenchmarkHarness, Vec<(PathBuf, IntensityBuffer)>)> {
    let mut harness = BenchmarkHarness::new(config)?;
    let mut writes = Vec::with_capacity(images.len() * 3);

    for LoadedImage { name, buffer } in images {
        match harness.run(name.as_str(), &buffer) {
            Ok(outcome) => {
                writes.push((output_dir.join(format!("sequential-{name}.png")), outcome.sequential_output));
                writes.push((output_dir.join(format!("parallel-{name}.png")), outcome.parallel_output));
                writes.push((noisy_dir.join(format!("{name}.png")), buffer));
            }
            Err(err) => log::warn!("skipping {name}: {err}"),
        }
    }

    Ok((harness, writes))
}

/// Image files directly inside `dir`, sorted by file name.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
