//! Snapmon CLI entry point.

use snapmon::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the check; the exit code mirrors the verdict severity
    let code = cli::execute(cli).await;
    std::process::exit(code);
}
