use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use image::ColorType;
use kmr::EncodeParameters;

#[derive(Parser)]
#[command(name = "kmr", version, about = "Encode and decode KMR hybrid lossless images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an image (PNG, JPEG, ... anything the `image` crate opens) into a .kmr container.
    Encode {
        input: PathBuf,

        /// Defaults to `input` with a `.kmr` extension.
        output: Option<PathBuf>,

        /// Tile size for the nodal YCrCb skeleton.
        #[arg(long, default_value_t = 8)]
        block_size: u8,

        /// Bits discarded from each nodal sample before quantization ([0, 6]).
        #[arg(long, default_value_t = 0)]
        discard_bits: u8,

        /// Fill each preview tile flat instead of bilinearly interpolating between nodes.
        #[arg(long)]
        no_smooth: bool,
    },

    /// Decode a .kmr container back into a PNG.
    Decode {
        input: PathBuf,

        /// Defaults to `input` with a `.png` extension.
        output: Option<PathBuf>,
    },

    /// Print a container's header fields and nodal grid size without decoding pixels.
    Inspect { input: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Encode { input, output, block_size, discard_bits, no_smooth } => {
            let output = output.unwrap_or_else(|| input.with_extension("kmr"));
            encode(&input, &output, block_size, discard_bits, !no_smooth)
        }
        Command::Decode { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("png"));
            decode(&input, &output)
        }
        Command::Inspect { input } => inspect(&input),
    }
}

fn encode(input: &Path, output: &Path, block_size: u8, discard_bits: u8, smooth: bool) -> Result<(), Box<dyn Error>> {
    let image = image::open(input)?.into_rgba8();
    let (width, height) = (image.width(), image.height());
    log::info!("encoding {} ({width}x{height}) -> {}", input.display(), output.display());

    let params = EncodeParameters::new(block_size, discard_bits, smooth);
    if params.block_size != block_size || params.discard_bits != discard_bits {
        log::warn!(
            "clamped --block-size {block_size} --discard-bits {discard_bits} to {} / {}",
            params.block_size,
            params.discard_bits
        );
    }
    let bytes = kmr::encode(image.as_raw(), width, height, params)?;
    fs::write(output, &bytes)?;

    log::info!("wrote {} bytes ({:.1}% of raw RGBA)", bytes.len(), 100.0 * bytes.len() as f64 / (width * height * 4) as f64);
    Ok(())
}

fn decode(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(input)?;
    log::info!("decoding {} ({} bytes) -> {}", input.display(), bytes.len(), output.display());

    let image = kmr::decode(&bytes)?;
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.rgba)
        .ok_or("decoded pixel buffer does not match its own width/height")?;
    image::save_buffer(output, buffer.as_raw(), image.width, image.height, ColorType::Rgba8)?;

    log::info!(
        "container layout: {} header + {} qoi + {} nodal = {} total",
        32,
        image.qoi_len,
        image.nodal_len,
        image.total_len
    );
    Ok(())
}

fn inspect(input: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(input)?;
    let image = kmr::decode(&bytes)?;
    println!("dimensions:   {}x{}", image.width, image.height);
    println!("block_size:   {}", image.block_size);
    println!("discard_bits: {}", image.discard_bits);
    println!("smooth:       {}", image.smooth);
    println!("nodal grid:   {}x{}", image.nodes.gw, image.nodes.gh);
    println!("qoi_len:      {}", image.qoi_len);
    println!("nodal_len:    {}", image.nodal_len);
    println!("total_len:    {}", image.total_len);
    Ok(())
}
