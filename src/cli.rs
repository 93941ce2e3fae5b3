use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;
use crate::pipeline::Viewer;

#[derive(StructOpt, Debug)]
#[structopt(
    name="matchview",
    about = "render mined AST pattern matches as highlighted HTML pages",
)]
enum Cli {
    Render {
        /// Directory holding the configuration, pattern and matches files.
        #[structopt(short, long, parse(from_os_str))]
        results: PathBuf,
        /// Directory of the mined source files (or of both corpora).
        #[structopt(short, long, parse(from_os_str))]
        source: PathBuf,
        #[structopt(short, long, parse(from_os_str))]
        output: PathBuf,
        /// Configuration file, if not the one in the results directory.
        #[structopt(short, long, parse(from_os_str))]
        config: Option<PathBuf>,
        #[structopt(short, long, parse(from_occurrences))]
        verbose: u64,
    },
}

fn init_logging(verbose: u64) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli() -> i32 {
    match Cli::from_args() {
        Cli::Render{results, source, output, config, verbose} => {
            init_logging(verbose);
            let viewer = Viewer::new(results, source, output);
            let viewer = match config {
                Some(config) => viewer.with_config(config),
                None => viewer,
            };
            match viewer.run() {
                Ok(report) => {
                    println!("{}", report.index.display());
                    0
                }
                Err(error) => {
                    tracing::error!(%error, "rendering failed");
                    eprintln!("error: {}", error);
                    1
                }
            }
        }
    }
}
