use std::error::Error;
use std::path::PathBuf;

use tracing_subscriber::{fmt, EnvFilter};

use nesd_dashboard::extract::{extract_table, YearInput};

const USAGE: &str = "usage: extract <out_dir> <table> <year>=<csv> [<year>=<csv> ...]";

fn main() -> Result<(), Box<dyn Error>> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(out_dir), Some(table)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let inputs = args
        .map(|arg| arg.parse::<YearInput>())
        .collect::<Result<Vec<_>, _>>()?;
    if inputs.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    match extract_table(&PathBuf::from(out_dir), &table, &inputs)? {
        Some(path) => println!("Saved {}", path.display()),
        None => println!("Not found for {table}"),
    }
    Ok(())
}
