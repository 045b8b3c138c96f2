use clap::Parser;
use ktop_tui::Cli;
use ktop_tui::run_main;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli).await?;
    Ok(())
}
