use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mnist_edge::{parse_sample, InferenceDriver, QuantMlp, QuantModel, RawSample};
use rayon::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mnist-replay", about = "Run a labelled sample file through the device inference path")]
struct Args {
    #[arg(long)]
    model: PathBuf,
    /// One sample per line: label then 784 pixel values
    #[arg(long)]
    samples: PathBuf,
    #[arg(long)]
    limit: Option<usize>,
}

struct Labelled {
    line_no: usize,
    label: usize,
    sample: RawSample,
}

fn load_samples(args: &Args) -> Result<Vec<Labelled>> {
    let f = std::fs::File::open(&args.samples)
        .with_context(|| format!("open samples: {}", args.samples.display()))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", i + 1))?;
        let l = line.trim();
        if l.is_empty() || l.starts_with('#') { continue; }
        let (label, rest) = l.split_once(char::is_whitespace).unwrap_or((l, ""));
        let label: usize = label.parse().with_context(|| format!("line {}: bad label {:?}", i + 1, label))?;
        let mut sample = RawSample::zeros();
        parse_sample(rest.as_bytes(), &mut sample).with_context(|| format!("line {}", i + 1))?;
        out.push(Labelled { line_no: i + 1, label, sample });
        if args.limit.map_or(false, |n| out.len() >= n) { break; }
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let model = QuantModel::load(&args.model)?;
    let samples = load_samples(&args)?;
    if samples.is_empty() { bail!("no samples in {}", args.samples.display()); }

    // fail fast on a model the device would reject
    let engine = QuantMlp::new(model);
    InferenceDriver::start(engine.clone())?;

    let pb = ProgressBar::new(samples.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}")
            .context("progress template")?
            .progress_chars("#>-"),
    );
    let results: Vec<(usize, usize, Option<usize>)> = samples
        .par_iter()
        .map_init(
            || InferenceDriver::start(engine.clone()).ok(),
            |driver, s| {
                let pred = driver.as_mut().and_then(|d| d.infer(&s.sample).ok()).map(|c| c.prediction);
                pb.inc(1);
                (s.line_no, s.label, pred)
            },
        )
        .collect();
    pb.finish_and_clear();

    let mut correct = 0usize;
    let mut failed = 0usize;
    let mut confusion = [[0usize; 10]; 10];
    for (line_no, label, pred) in &results {
        match pred {
            Some(p) => {
                if p == label { correct += 1; }
                if *label < 10 && *p < 10 { confusion[*label][*p] += 1; }
            }
            None => { failed += 1; log::warn!("line {}: inference failed", line_no); }
        }
    }
    let total = results.len();
    println!("samples: {}  correct: {}  failed: {}  accuracy: {:.2}%", total, correct, failed, 100.0 * correct as f64 / total as f64);
    println!("confusion (rows = label, cols = prediction):");
    for (label, row) in confusion.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|n| format!("{:5}", n)).collect();
        println!("{}: {}", label, cells.join(""));
    }
    Ok(())
}
