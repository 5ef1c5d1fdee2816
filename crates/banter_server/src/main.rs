use banter_server::{init_logger, Result, API};
use clap::Parser;

#[derive(Parser)]
#[command(name = "banter-server", about = "Streaming chat gateway")]
struct Cli {
    /// Port to listen on; overrides BANTER_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger();

    let mut api = API::init()?;
    if let Some(port) = cli.port {
        api = api.port(port);
    }

    api.launch().await
}
