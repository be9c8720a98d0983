mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use specpost::config::ConfigOverrides;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            files,
            env,
            base_url,
            timeout_ms,
            report,
            verbose,
            parallel,
            config,
        } => {
            // 初始化日志系统
            specpost::logger::init_logger(verbose);

            let args = RunArgs {
                files,
                env,
                overrides: ConfigOverrides {
                    base_url,
                    timeout_ms,
                    report,
                },
                verbose,
                parallel,
                config,
            };

            if !cli::run(args).await? {
                std::process::exit(1);
            }
        }
        Commands::Check { files } => {
            specpost::logger::init_logger(false);
            cli::check(&files)?;
        }
    }

    Ok(())
}
