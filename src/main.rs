use clap::{Parser, Subcommand};
use rasterconv::config::{self, ConverterConfig};
use rasterconv::imaging::{Converter, EngineProvider, HostEncoder, OutputFormat};
use rasterconv::output::{self, ConversionSummary};
use rasterconv::session::Session;
use rasterconv::sink::{LogSink, TracingSink};
use rasterconv::types::ConversionRequest;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rasterconv")]
#[command(about = "Convert and resize raster images")]
#[command(long_about = "\
Convert and resize raster images

Reads an image (PNG, JPEG, WebP, TIFF, ...), optionally resizes it to an
exact width and height, and writes it back out as converted.<format>.

A missing or non-numeric --width or --height keeps the source's value for
that side. Aspect ratio is not preserved.

Set RUST_LOG=debug for per-step engine logging.
Run 'rasterconv gen-config' to generate a documented rasterconv.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "rasterconv.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one image
    Convert(ConvertArgs),
    /// List the output formats the current config accepts
    Formats,
    /// Print a stock rasterconv.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Image to convert
    input: PathBuf,

    /// Target width in pixels
    #[arg(long, default_value = "")]
    width: String,

    /// Target height in pixels
    #[arg(long, default_value = "")]
    height: String,

    /// Output format (defaults to output.default_format)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Directory the converted file is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print a JSON summary instead of the text listing
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => {
            let config = config::load_config(&cli.config)?;
            convert(&config, args)?;
        }
        Command::Formats => {
            let config = config::load_config(&cli.config)?;
            output::print_formats(&config.format_set(), config.output.default_format);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn convert(config: &ConverterConfig, args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);

    // Engine load and file decode overlap, as they would in an interactive session.
    let provider = Arc::new(EngineProvider::new());
    let loading = provider.spawn_initialize(config.loader(), sink.clone());

    let converter = Converter::new(provider.clone(), sink.clone())
        .with_encoder(HostEncoder::new(config.quality()))
        .with_formats(config.format_set())
        .with_filter(config.resize.filter);
    let mut session = Session::new(converter);
    session.select_file(&args.input)?;

    loading
        .join()
        .map_err(|_| "image engine loader thread panicked")??;

    let format = args.format.unwrap_or(config.output.default_format);
    let request = ConversionRequest::from_input(&args.width, &args.height, format);
    session.convert(&request)?;

    let (Some(source), Some(result)) = (session.source(), session.preview()) else {
        return Err("conversion produced no result".into());
    };
    let saved = result.write_to_dir(&args.out_dir)?;
    let summary = ConversionSummary::new(&args.input, source, result, &saved);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_convert_output(&summary, &format!("{:?}", source.format()));
    }
    Ok(())
}
