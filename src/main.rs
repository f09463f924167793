use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use plugbot::application::messaging::{CommandDispatcher, ContextBuilder};
use plugbot::application::services::MessageService;
use plugbot::domain::traits::Bot;
use plugbot::infrastructure::adapters::console::ConsoleAdapter;
use plugbot::infrastructure::config::Config;
use plugbot::infrastructure::plugins::{self, builtin, HandlerTable, PluginRegistry, PluginWatcher};

#[derive(Parser)]
#[command(name = "plugbot")]
#[command(about = "Hot-reloading plugin command bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Plugin directory (overrides config)
    #[arg(short, long)]
    plugin_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console transport
    Run {
        /// Treat console input as coming from a group chat
        #[arg(long)]
        group: bool,
    },
    /// List the commands the plugin directory provides
    Plugins,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { group } => {
            let config = load_config(&cli.config, cli.plugin_dir);
            run_bot(config, group);
        }
        Commands::Plugins => {
            let config = load_config(&cli.config, cli.plugin_dir);
            list_plugins(&config);
        }
        Commands::Version => {
            println!("plugbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str, plugin_dir: Option<PathBuf>) -> Config {
    let mut config = if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(dir) = plugin_dir {
        config.plugins.directory = dir;
    }
    config
}

fn run_bot(config: Config, group: bool) {
    once_cell::sync::Lazy::force(&builtin::STARTED);
    tracing::info!("Starting {} with prefix {:?}", config.bot.name, config.bot.prefix);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let adapter = if group {
            Arc::new(ConsoleAdapter::new().in_group())
        } else {
            Arc::new(ConsoleAdapter::new())
        };
        run_console_bot(adapter, config).await;
    });
}

async fn run_console_bot(adapter: Arc<ConsoleAdapter>, config: Config) {
    let registry = Arc::new(PluginRegistry::new());
    let loader = plugins::default_loader(
        &config.plugins.directory,
        Arc::clone(&registry),
        HandlerTable::builtin(),
    );
    loader.load_blocking().await;

    let watch = if config.plugins.watch {
        match PluginWatcher::watch(loader.clone(), config.debounce()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Plugin hot reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let dispatcher = CommandDispatcher::new(
        registry,
        ContextBuilder::new(&config.bot.prefix, &config.bot.direct_chat_suffix),
    )
    .with_messages(config.dispatch_messages())
    .with_match_policy(config.dispatch.match_policy)
    .with_handler_timeout(config.handler_timeout());

    let bot: Arc<dyn Bot> = adapter.clone();
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }
    tracing::info!("Bot started: {}", bot.bot_info().name);

    let service = MessageService::new(bot, dispatcher)
        .with_ignore_own_messages(config.bot.ignore_own_messages)
        .with_processing_failed(config.messages.processing_failed.as_str());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    // Each message runs on its own task so a slow command does not block input
                    let message = adapter.inbound(input);
                    let service = service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = service.process(message).await {
                            tracing::error!("Failed to process message: {}", e);
                        }
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully...");
                break;
            }
        }
    }

    if let Some(handle) = watch {
        handle.release().await;
    }
}

fn list_plugins(config: &Config) {
    let registry = Arc::new(PluginRegistry::new());
    let loader = plugins::default_loader(
        &config.plugins.directory,
        Arc::clone(&registry),
        HandlerTable::builtin(),
    );

    for unit in loader.load().iter() {
        let mut flags = Vec::new();
        if unit.restrict_to_bot_self() {
            flags.push("bot-self");
        }
        if unit.restrict_to_private_chat() {
            flags.push("private");
        }
        let commands: Vec<String> = unit
            .commands()
            .iter()
            .map(|c| format!("{}{}", config.bot.prefix, c))
            .collect();
        println!("{:<24} {} {}", unit.origin(), commands.join(", "), flags.join(" "));
    }
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render config: {}", e),
    }
}
