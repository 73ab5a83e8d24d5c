use anki_sync_status::{
    init_errors,
    init_logging,
    start_server,
};
use clap::Parser;
use color_eyre::Result;
use sync_status_config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.log_format)?;
    start_server(args).await
}
