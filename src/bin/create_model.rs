use clap::Parser;
use mnist_edge::QuantModel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mnist-create-model", about = "Write a randomly initialised MNISTQ01 model for smoke tests")]
struct Args {
    #[arg(long, default_value = "weights/mnist_random.q8")]
    out: PathBuf,
    #[arg(long, default_value_t = 32)]
    hidden: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    if a.hidden == 0 { anyhow::bail!("--hidden must be at least 1"); }
    if let Some(dir) = a.out.parent() {
        if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
    }
    let model = QuantModel::random(a.hidden, a.seed);
    model.save(&a.out)?;
    println!(
        "wrote {} ({}-{}-{}, seed {})",
        a.out.display(), model.meta.input_dim, model.meta.hidden_dim, model.meta.output_dim, a.seed
    );
    Ok(())
}
