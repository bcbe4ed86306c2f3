//! dockhand - provision, secure and inventory remote Docker hosts

use clap::Parser;
use tokio_util::sync::CancellationToken;

use dockhand_cli::cli::Cli;
use dockhand_cli::logging;
use dockhand_cli::output::json::{error_code, format_error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let json = cli.json;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping after the current step...");
            on_interrupt.cancel();
        }
    });

    if let Err(e) = cli.run(cancel).await {
        if json {
            match format_error(&format!("{e:#}"), error_code(&e)) {
                Ok(out) => println!("{out}"),
                Err(_) => eprintln!("Error: {e}"),
            }
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
