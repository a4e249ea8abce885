//! Generate command - render a job file into a tile pyramid.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tileforge::config::{ConfigFile, JobFile};
use tileforge::generation::{
    GenerationOptions, GenerationProgress, ProgressSink, TileGenerationService,
};
use tileforge::output::OutputFormat;
use tileforge::render::{FontBook, StyledRendererFactory};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::FormatArg;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the generate command.
pub struct GenerateArgs {
    pub job: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<FormatArg>,
    pub threads: Option<usize>,
    pub overwrite: bool,
    pub debug: bool,
}

/// Run the generate command.
pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("generate");
    let config = runner.config();

    let job = JobFile::load(&args.job)?;
    let options = resolve_options(&job, &args, config)?;
    let sources = job.build_sources()?;

    let mut factory =
        StyledRendererFactory::new(Arc::new(sources)).with_settings(config.raster_settings());
    if let Some(font) = &config.render.font {
        let mut fonts = FontBook::new();
        let name = fonts.load_file(font).map_err(CliError::Font)?;
        info!(font = %name, "Loaded label font");
        factory = factory.with_fonts(fonts);
    }
    let service = TileGenerationService::new(Arc::new(factory))
        .with_settings(config.generation_settings());

    println!("Generating tiles");
    println!("  Job:     {}", args.job.display());
    println!("  Output:  {} ({})", options.output.display(), options.format);
    println!("  Zoom:    {}-{}", options.min_zoom, options.max_zoom);
    println!("  Layers:  {}", options.layers.len());
    println!("  Workers: {}", options.worker_count());
    println!();
    println!("Press Ctrl+C to stop after in-flight tiles finish");
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let cancellation = CancellationToken::new();
    let cancel_on_signal = cancellation.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received interrupt, finishing in-flight tiles...");
        cancel_on_signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = progress_bar();
    let sink_bar = bar.clone();
    let sink: Arc<dyn ProgressSink> = Arc::new(move |progress: GenerationProgress| {
        sink_bar.set_length(progress.total);
        sink_bar.set_position(progress.completed + progress.failed);
        sink_bar.set_message(format!(
            "{:.1} tiles/s, {} failed",
            progress.tiles_per_second, progress.failed
        ));
    });

    let outcome = runtime.block_on(service.generate(options, Some(sink), cancellation));
    bar.finish_and_clear();
    let result = outcome?;

    println!("Generation complete");
    println!(
        "  Tiles:    {} of {} ({} failed)",
        result.completed_tiles, result.total_tiles, result.failed_tiles
    );
    println!("  Duration: {}", format_duration(result.duration));
    Ok(())
}

/// Merge CLI arguments, job values and `config.ini`, in that order of precedence.
fn resolve_options(
    job: &JobFile,
    args: &GenerateArgs,
    config: &ConfigFile,
) -> Result<GenerationOptions, CliError> {
    let mut options = job.to_options(config.output.format, config.generation.threads)?;

    if let Some(format) = args.format {
        options = options.with_format(OutputFormat::from(format));
    }
    if let Some(output) = &args.output {
        options.output = output.clone();
    }
    if let Some(threads) = args.threads {
        options = options.with_threads(threads);
    }
    if args.overwrite {
        options = options.with_overwrite(true);
    }
    Ok(options)
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} (eta {eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(0).with_style(style);
    bar.enable_steady_tick(Duration::from_millis(200));
    bar
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job_in(dir: &TempDir) -> JobFile {
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{
                "output": "tiles",
                "format": "xyz",
                "min_zoom": 0,
                "max_zoom": 3,
                "bbox": [124.0, 33.0, 132.0, 43.0],
                "threads": 2,
                "data_sources": [],
                "layers": []
            }"#,
        )
        .unwrap();
        JobFile::load(&path).unwrap()
    }

    fn args(job: PathBuf) -> GenerateArgs {
        GenerateArgs {
            job,
            output: None,
            format: None,
            threads: None,
            overwrite: false,
            debug: false,
        }
    }

    #[test]
    fn test_job_values_win_over_config() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir);
        let mut config = ConfigFile::default();
        config.output.format = OutputFormat::Mbtiles;
        config.generation.threads = 8;

        let options = resolve_options(&job, &args(dir.path().join("job.json")), &config).unwrap();

        assert_eq!(options.format, OutputFormat::Xyz);
        assert_eq!(options.threads, 2);
        assert_eq!(options.output, dir.path().join("tiles"));
        assert!(!options.overwrite);
    }

    #[test]
    fn test_cli_values_win_over_job() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir);
        let mut cli = args(dir.path().join("job.json"));
        cli.format = Some(FormatArg::Mbtiles);
        cli.output = Some(PathBuf::from("/tmp/elsewhere"));
        cli.threads = Some(3);
        cli.overwrite = true;

        let options = resolve_options(&job, &cli, &ConfigFile::default()).unwrap();

        assert_eq!(options.format, OutputFormat::Mbtiles);
        assert_eq!(options.output, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(options.threads, 3);
        assert!(options.overwrite);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }
}
