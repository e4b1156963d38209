pub mod cli;
pub mod clients;
pub mod config;
pub mod credentials;
pub mod db;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod models;

use anyhow::Context;
use cli::{
    Cli, Commands, ModelCommands, PromptCommands, ResultCommands, SendArgs, SettingCommands,
};
pub use config::Config;
use db::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads the config named on the command line, or the first one found.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    // Logs share the terminal with command output, so keep them on stderr.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    if matches!(cli.command, Commands::Init) {
        return cli::cmd_init(cli.config.as_deref());
    }

    config.validate()?;

    let store = Store::with_pool_options(
        &config.general.database_url(),
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .with_context(|| format!("Failed to open database {}", config.general.database_path))?;

    info!("Using database {}", config.general.database_path);

    let result = run_command(cli.command, &config, &store).await;
    store.close().await?;
    result
}

async fn run_command(command: Commands, config: &Config, store: &Store) -> anyhow::Result<()> {
    match command {
        Commands::Init => Ok(()),

        Commands::Prompt { command } => match command {
            PromptCommands::Add { text, tags } => {
                cli::cmd_prompt_add(store, &text.join(" "), tags.as_deref()).await
            }
            PromptCommands::List { oldest } => cli::cmd_prompt_list(store, oldest).await,
            PromptCommands::Search { query, tags_only } => {
                cli::cmd_prompt_search(store, &query.join(" "), tags_only).await
            }
            PromptCommands::Tag { id, tags } => cli::cmd_prompt_tag(store, id, &tags).await,
            PromptCommands::Delete { id } => cli::cmd_prompt_delete(store, id).await,
        },

        Commands::Model { command } => match command {
            ModelCommands::Add {
                name,
                url,
                credential,
                provider,
            } => cli::cmd_model_add(store, &name, &url, &credential, provider.as_deref()).await,
            ModelCommands::List { all } => cli::cmd_model_list(store, all).await,
            ModelCommands::Search { query } => cli::cmd_model_search(store, &query).await,
            ModelCommands::Update {
                id,
                name,
                url,
                credential,
                provider,
            } => cli::cmd_model_update(store, id, name, url, credential, provider).await,
            ModelCommands::Enable { id } => cli::cmd_model_set_active(store, id, true).await,
            ModelCommands::Disable { id } => cli::cmd_model_set_active(store, id, false).await,
            ModelCommands::Delete { id } => cli::cmd_model_delete(store, id).await,
        },

        Commands::Send {
            text,
            prompt_id,
            tags,
            models,
            save,
            replace,
            note,
            timeout,
            export,
        } => {
            let args = SendArgs {
                text: text.join(" "),
                prompt_id,
                tags,
                models,
                save,
                replace,
                note,
                timeout,
                export,
            };
            cli::cmd_send(config, store, args).await
        }

        Commands::Results { command } => match command {
            ResultCommands::List { prompt, model } => {
                cli::cmd_result_list(store, prompt, model).await
            }
            ResultCommands::Show { id } => cli::cmd_result_show(store, id).await,
            ResultCommands::Search { query } => {
                cli::cmd_result_search(store, &query.join(" ")).await
            }
            ResultCommands::Delete { id } => cli::cmd_result_delete(store, id).await,
        },

        Commands::Settings { command } => match command {
            SettingCommands::Get { key } => cli::cmd_setting_get(store, &key).await,
            SettingCommands::Set { key, value } => cli::cmd_setting_set(store, &key, &value).await,
            SettingCommands::Unset { key } => cli::cmd_setting_unset(store, &key).await,
            SettingCommands::List => cli::cmd_setting_list(store).await,
        },
    }
}
