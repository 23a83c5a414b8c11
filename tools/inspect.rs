// SPDX-License-Identifier: MIT
//! Print the framing and format details of a Nitro bundle, optionally
//! running a full decode.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use nitro_bundle::{BundleDecoder, ConfigOverrides, DecoderConfig, InspectReport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser)]
#[command(name = "nitro-inspect", about = "Inspect a Nitro asset bundle")]
struct Cli {
    /// Bundle file to read
    file: PathBuf,

    /// Run a full decode (transcode + bitmap materialization)
    #[arg(long)]
    decode: bool,

    /// TOML file whose keys override the matching NITRO_* environment settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DecoderConfig> {
    let mut config = DecoderConfig::from_env();
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let overrides: ConfigOverrides = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config = config.with_overrides(overrides);
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_report(report: &InspectReport) {
    println!("File size: {}", report.input_length);
    println!("Outer zstd: {}", report.outer_envelope);
    if report.outer_envelope {
        println!("Outer decompressed size: {}", report.container_length);
    }
    println!("Entry count: {}", report.entries.len());

    for entry in &report.entries {
        println!();
        println!("--- {} ({} bytes stored) ---", entry.name, entry.declared_length);
        println!("Compression: {}", entry.compression);
        if let Some(reason) = &entry.inflate_error {
            println!("Inflate failed, kept raw: {}", reason);
        }
        println!("Decompressed size: {}", entry.decompressed_length);
        println!("Header: {}", hex(&entry.head));
        match entry.signature {
            Some(signature) => println!("Image signature: {}", signature),
            None => println!("Descriptor"),
        }
    }

    if report.trailing_bytes > 0 {
        println!();
        println!("Trailing bytes ignored: {}", report.trailing_bytes);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = load_config(cli.config.as_ref())?;
    let data = std::fs::read(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let decoder = BundleDecoder::with_default_codecs().with_config(config);

    let report = decoder.inspect(&data)?;
    print_report(&report);

    if cli.decode {
        let bundle = decoder.decode(&data).await?;

        println!();
        match bundle.descriptor().and_then(|d| d.as_object()) {
            Some(object) => {
                let keys: Vec<_> = object.keys().map(String::as_str).collect();
                println!("Descriptor keys: {}", keys.join(", "));
            }
            None if bundle.descriptor().is_some() => println!("Descriptor: non-object JSON"),
            None => println!("Descriptor: none"),
        }
        match (bundle.image_name(), bundle.bitmap()) {
            (Some(name), Some(bitmap)) => {
                println!("Bitmap: {} {}x{}", name, bitmap.width(), bitmap.height())
            }
            _ => println!("Bitmap: none"),
        }
        for diagnostic in bundle.diagnostics() {
            println!("Degraded: {}", diagnostic);
        }
    }

    Ok(())
}
