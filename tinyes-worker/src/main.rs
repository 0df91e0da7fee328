use anyhow::Result;
use structopt::StructOpt;

use tinyes_worker::server::serve;
use tinyes_worker::settings::{CommandLineArgs, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let command_line_args = CommandLineArgs::from_args();
    let settings = Settings::load(command_line_args.config)?;

    serve(settings).await
}
