use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = helm_sync::Args::parse();

	helm_sync::run(args).await
}
