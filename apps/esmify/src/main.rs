use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use esmify_convert::Config;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "esmify")]
#[command(about = "Rewrite CommonJS modules as ES modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert CommonJS files to ES modules
    Convert(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Convert(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Converting {:?} (using {} threads)", cfg.paths, num_threads);
            let json = cfg.json;

            let result = esmify_convert::run_convert(cfg)?;
            let elapsed_ms = start.elapsed().as_millis();

            if json {
                esmify_convert::print_json(&mut stdout, &result)?;
            } else {
                esmify_convert::print_converted_code(&mut stdout, &result)?;
                esmify_convert::print_report(&mut stdout, &result)?;
                esmify_convert::print_summary(&mut stdout, &result)?;
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files.len().to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
            }
            stdout.flush()?;

            if result.failed() > 0 {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
