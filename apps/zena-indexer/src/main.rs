// crates.io
use clap::Parser;
// self
use zena_indexer::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	zena_indexer::run(args).await
}
