//! Discord Chat Fetcher - page through channel history and export it.
//!
//! Talks to the Discord REST API with a user session token, lists the
//! conversations the account can reach, and retrieves the newest N messages
//! of a channel in chronological order.
//!
//! QUICK START:
//!   discord-chat-fetcher login                     # Store a token
//!   discord-chat-fetcher channels                  # List DMs and server channels
//!   discord-chat-fetcher fetch <id> -n 500 -e txt  # Fetch and export a channel
//!   discord-chat-fetcher pick --dm                 # Choose interactively

mod application;
mod cli;
mod domain;
mod infrastructure;

use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    export_to_file, format_direct_table, format_guild_channels_table, format_guilds_table,
    render_messages_terminal, session, ChannelDirectory, ExportFormat, Paginator,
    RateLimitedTransport, Selector,
};
use cli::{read_line, Cli, Commands, ConfigAction, Scope, StdinSelector};
use domain::{AppConfig, CredentialStorage};
use infrastructure::{
    ensure_config_exists, load_config, load_token, render_config, save_token, save_token_keyring,
    HttpTransport, Session, TOKEN_ENV,
};

type Client = RateLimitedTransport<HttpTransport>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Whoami => {
            connect(&config).await?;
        }
        Commands::Channels { dm, guilds } => {
            cmd_channels(&config, Scope::from_flags(dm, guilds)).await?;
        }
        Commands::Fetch {
            channel_id,
            count,
            name,
            export,
            quiet,
        } => {
            let client = connect(&config).await?;
            let label = name.unwrap_or_else(|| channel_id.clone());
            let count = count.unwrap_or_else(|| default_count(&config));
            fetch_and_show(&client, &config, &channel_id, &label, count, export, quiet).await?;
        }
        Commands::Pick {
            dm,
            guilds,
            count,
            export,
        } => {
            cmd_pick(&config, Scope::from_flags(dm, guilds), count, export).await?;
        }
        Commands::Login => {
            cmd_login(&config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config.as_deref(), &config, action)?;
        }
    }

    Ok(())
}

/// Builds the client and validates the session.
async fn connect(config: &AppConfig) -> anyhow::Result<Client> {
    let token = load_token(config.storage.credential_storage, &AppConfig::token_file_path())?
        .with_context(|| {
            format!("No token found. Set {TOKEN_ENV} or run `discord-chat-fetcher login`")
        })?;

    let auth = Session::new(&token, &config.api)?;
    let http = HttpTransport::new(&auth, &config.api)?;
    let client = RateLimitedTransport::new(http, config.pacing.clone());

    let user = session::validate(&client)
        .await
        .context("Session validation failed")?;

    println!(
        "{} Connected as {}",
        "✓".green().bold(),
        user.global_name.as_deref().unwrap_or(&user.username).cyan()
    );

    Ok(client)
}

/// List channels command.
async fn cmd_channels(config: &AppConfig, scope: Scope) -> anyhow::Result<()> {
    let client = connect(config).await?;
    let directory = ChannelDirectory::new(&client)
        .list(scope.includes_direct(), scope.includes_guilds())
        .await?;

    if scope.includes_direct() {
        println!();
        println!("{}", "💬 Direct Messages".bold());
        if directory.direct_channels.is_empty() {
            println!("  (none)");
        } else {
            println!("{}", format_direct_table(&directory.direct_channels));
        }
    }

    if scope.includes_guilds() {
        for guild in directory.guilds.values() {
            println!();
            println!("{} {}", "🏠".bold(), guild.name.bold());
            println!("{}", format_guild_channels_table(guild));
        }
        if directory.guilds.is_empty() {
            println!();
            println!("No readable server channels.");
        }
    }

    println!();
    println!("Total: {} channel(s)", directory.channel_count());

    Ok(())
}

/// Interactive channel selection followed by a fetch.
async fn cmd_pick(
    config: &AppConfig,
    scope: Scope,
    count: Option<i64>,
    export: Option<ExportFormat>,
) -> anyhow::Result<()> {
    let client = connect(config).await?;
    let mut selector = StdinSelector::new();

    let scope = match scope {
        Scope::Both => {
            let options = ["Direct messages".to_string(), "Server channels".to_string()];
            match selector.select("Fetch from", &options)? {
                Some(0) => Scope::Direct,
                Some(_) => Scope::Guilds,
                None => return Ok(()),
            }
        }
        other => other,
    };

    let directory = ChannelDirectory::new(&client)
        .list(scope.includes_direct(), scope.includes_guilds())
        .await?;

    let channel = if scope == Scope::Direct {
        if directory.direct_channels.is_empty() {
            bail!("No direct conversations found");
        }
        println!("{}", format_direct_table(&directory.direct_channels));

        let options: Vec<String> = directory
            .direct_channels
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let prompt = "Select conversation (number or name, q to quit)";
        let Some(index) = selector.select(prompt, &options)? else {
            return Ok(());
        };
        &directory.direct_channels[index]
    } else {
        if directory.guilds.is_empty() {
            bail!("No servers with readable text channels found");
        }
        println!("{}", format_guilds_table(&directory));

        let guilds: Vec<_> = directory.guilds.values().collect();
        let options: Vec<String> = guilds.iter().map(|g| g.name.clone()).collect();
        let prompt = "Select server (number or name, q to quit)";
        let Some(index) = selector.select(prompt, &options)? else {
            return Ok(());
        };
        let guild = guilds[index];

        println!("{}", format_guild_channels_table(guild));
        let options: Vec<String> = guild.channels.iter().map(|c| c.name.clone()).collect();
        let prompt = "Select channel (number or name, q to quit)";
        let Some(index) = selector.select(prompt, &options)? else {
            return Ok(());
        };
        &guild.channels[index]
    };

    // Releases the stdin lock before reading the count.
    drop(selector);

    let count = match count {
        Some(count) => count,
        None => {
            let answer = read_line(&format!(
                "Number of messages to fetch [{}]: ",
                config.fetch.default_count
            ))?;
            if answer.is_empty() {
                default_count(config)
            } else {
                answer
                    .parse()
                    .with_context(|| format!("Not a number: {answer}"))?
            }
        }
    };

    fetch_and_show(&client, config, &channel.id, &channel.label(), count, export, false).await
}

fn default_count(config: &AppConfig) -> i64 {
    i64::try_from(config.fetch.default_count).unwrap_or(i64::MAX)
}

/// Runs the engine for one channel, then displays and optionally exports.
async fn fetch_and_show(
    client: &Client,
    config: &AppConfig,
    channel_id: &str,
    label: &str,
    count: i64,
    export: Option<ExportFormat>,
    quiet: bool,
) -> anyhow::Result<()> {
    println!("Fetching up to {count} messages from {}...", label.cyan());

    let result = Paginator::new(client).fetch(channel_id, count).await?;

    if !quiet {
        print!("{}", render_messages_terminal(&result, label));
    }

    println!();
    println!(
        "{} Retrieved {} of {} requested messages",
        "✓".green().bold(),
        result.len(),
        result.requested()
    );
    if result.dropped() > 0 {
        println!(
            "{} {} message(s) skipped due to unreadable data",
            "!".yellow().bold(),
            result.dropped()
        );
    }

    if let Some(format) = export {
        if result.is_empty() {
            println!("Nothing to export.");
        } else {
            let path = export_to_file(&result, label, format, &config.save_dir())?;
            println!("{} Exported to {}", "📁".bold(), path.display());
        }
    }

    Ok(())
}

/// Store a token in the token file.
fn cmd_login(config: &AppConfig) -> anyhow::Result<()> {
    let storage = config.storage.credential_storage;
    if storage == CredentialStorage::Env {
        println!(
            "{} credential_storage is \"env\"; the saved file is ignored until it is \"file\"",
            "!".yellow().bold()
        );
    }

    let token = read_line("Paste your Discord token: ")?;

    if storage == CredentialStorage::Keyring {
        save_token_keyring(&token)?;
        println!("{} Token saved to the system keyring", "✓".green().bold());
        return Ok(());
    }

    let path = AppConfig::token_file_path();
    save_token(&path, &token)?;

    println!("{} Token saved to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Configuration file commands.
fn cmd_config(
    path: Option<&std::path::Path>,
    config: &AppConfig,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let (path, created) = ensure_config_exists(path)?;
            if created {
                println!("{} Created {}", "✓".green().bold(), path.display());
            } else {
                println!("Already exists: {}", path.display());
            }
        }
        ConfigAction::Path => {
            let path =
                path.map_or_else(AppConfig::default_config_path, std::path::Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", render_config(config)?);
        }
    }

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
