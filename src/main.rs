use clap::Parser;
use dirsweep::cli::{Args, run_cli};
use dirsweep::output::OutputFormatter;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match run_cli(&args) {
        Ok(summary) => {
            log::info!("{}", OutputFormatter::summary_line(&summary));
            if summary.matched == 0 {
                OutputFormatter::warning(&format!("No files matched under {}", args.root.display()));
            }
        }
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            process::exit(1);
        }
    }
}
