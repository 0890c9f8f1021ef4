//! telegram-llm-bot: entry point. Loads `.env`, parses the CLI, and runs the gateway or polling mode.

use anyhow::Result;
use clap::Parser;
use telegram_bot::{init_tracing, load_config, Cli, Commands};
use telegram_llm_bot::{run_bot_with_llm, run_bot_with_polling};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            token,
            bind,
            polling,
        } => {
            let config = load_config(token, bind)?;
            init_tracing(config.log_file())?;
            config.warn_missing();
            if polling {
                run_bot_with_polling(config).await
            } else {
                run_bot_with_llm(config).await
            }
        }
    }
}
