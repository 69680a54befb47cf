use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = note_dispatch::cli::Cli::parse();
    if let Err(e) = note_dispatch::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
