use anyhow::Result;
use clap::Parser;
use log::info;
use mnist_edge::{halt, Device, DeviceConfig, EmulatorOled, LineChannel, QuantMlp, QuantModel, TimedReader};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "MNIST INT8 classifier fed over a line-oriented serial link", long_about = None)]
struct Args {
    /// Path to the quantized model (MNISTQ01)
    #[arg(long)]
    model: PathBuf,

    /// JSON device configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort a host read after this many milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Skip the blank flush before drawing each sample
    #[arg(long)]
    single_flush: bool,

    /// Exit instead of idling forever after a terminal fault
    #[arg(long)]
    exit_on_fault: bool,

    /// Wait before the banner, like the board does for USB enumeration
    #[arg(long)]
    startup_delay_ms: Option<u64>,

    /// Keep only this many OLED frames in the emulator
    #[arg(long, default_value_t = 8)]
    frame_history: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(p) => DeviceConfig::load(p)?,
        None => DeviceConfig::default(),
    };
    if args.read_timeout_ms.is_some() { cfg.read_timeout_ms = args.read_timeout_ms; }
    if args.single_flush { cfg.blank_before_render = false; }
    if args.exit_on_fault { cfg.exit_on_fault = true; }
    if let Some(ms) = args.startup_delay_ms { cfg.startup_delay_ms = ms; }

    info!("loading model from {}", args.model.display());
    let model = QuantModel::load(&args.model)?;
    info!("model v{} {}-{}-{}", model.meta.version, model.meta.input_dim, model.meta.hidden_dim, model.meta.output_dim);

    let reader: Box<dyn BufRead> = match cfg.read_timeout_ms {
        Some(ms) => Box::new(BufReader::new(TimedReader::spawn(io::stdin(), Duration::from_millis(ms))?)),
        None => Box::new(io::stdin().lock()),
    };
    let host = LineChannel::new(reader, io::stdout());

    match Device::init(&cfg, QuantMlp::new(model), EmulatorOled::with_history(args.frame_history), host) {
        Ok(mut device) => {
            device.run();
            Ok(())
        }
        Err(e) => {
            halt(&e, cfg.exit_on_fault);
            Err(e.into())
        }
    }
}
