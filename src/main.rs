use clap::Parser;
use env_logger::Env;

use stamp_vision::Opts;
use stamp_vision::cli::SubCommandExtend;
use stamp_vision::config::SubCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Server(config) => config.run(&opts).await,
        SubCommand::Match(config) => config.run(&opts).await,
    }
}
