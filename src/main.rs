use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gard_client::api::{ApiError, ChatClient, GardApi, PublicationApi};
use gard_client::cache::{DiskCache, ResultCache};
use gard_client::config::{default_config_path, find_config_file, load_config, Config};
use gard_client::listing::{ListingController, ListingEvent};
use gard_client::ui;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// GARD client - Browse, search and question the GARD research publication corpus
#[derive(Parser, Debug)]
#[command(name = "gard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and search GARD research publications", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Disable the page cache for this command (useful for testing fresh results)
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the publication listing page by page
    #[command(alias = "b")]
    Browse {
        /// Page to show
        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Search publications by query string
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Page of results to show
        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Show the full record of one publication
    #[command(alias = "p")]
    Paper {
        /// PMC identifier, e.g. PMC10348123
        id: String,
    },

    /// Ask the chatbot a question about the whole corpus
    #[command(alias = "a")]
    Ask {
        /// Question to ask
        question: String,

        /// Number of passages to retrieve
        #[arg(long, default_value_t = 10)]
        top_k: u32,
    },

    /// Ask the chatbot a question about one specific paper
    AskPaper {
        /// PMC identifier or article URL
        paper: String,

        /// Question to ask
        question: String,
    },

    /// Manage the local page cache
    Cache {
        /// Subcommand
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Manage configuration
    Config {
        /// Subcommand
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache status and statistics
    Status,

    /// Clear all cached pages
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init,

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("gard_client={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // `config init` runs before config loading, its target usually does
    // not exist yet.
    if let Some(Commands::Config {
        command: ConfigCommands::Init,
    }) = &cli.command
    {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        Config::default().save(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        Config::default()
    };

    if let Some(timeout) = cli.timeout {
        config.api.timeout_seconds = timeout;
    }

    url::Url::parse(&config.api.base_url)
        .with_context(|| format!("Invalid api.base_url: {}", config.api.base_url))?;

    match cli.command {
        Some(Commands::Browse { page }) => {
            show_listing(&config, None, page, cli.output, cli.quiet, cli.no_cache).await?;
        }

        Some(Commands::Search { query, page }) => {
            if query.trim().is_empty() {
                anyhow::bail!("Search query must not be empty");
            }
            show_listing(
                &config,
                Some(&query),
                page,
                cli.output,
                cli.quiet,
                cli.no_cache,
            )
            .await?;
        }

        Some(Commands::Paper { id }) => {
            let api = GardApi::from_config(&config.api);
            let publication = with_spinner(cli.quiet, "Fetching paper...", api.get_paper(&id))
                .await
                .with_context(|| format!("Failed to fetch paper {}", id))?;

            match resolve_format(cli.output) {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&publication)?);
                }
                _ => ui::print_publication_detail(&publication),
            }
        }

        Some(Commands::Ask { question, top_k }) => {
            let chat = ChatClient::from_config(&config.api);
            let answer = with_spinner(cli.quiet, "Thinking...", chat.ask(&question, top_k))
                .await
                .context("Chatbot request failed")?;

            match resolve_format(cli.output) {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&answer)?);
                }
                _ => ui::print_chat_answer(&answer),
            }
        }

        Some(Commands::AskPaper { paper, question }) => {
            let chat = ChatClient::from_config(&config.api);

            // The chatbot addresses papers by link; ids go through the
            // detail endpoint first.
            let link = if paper.starts_with("http") {
                paper
            } else {
                let api = GardApi::from_config(&config.api);
                let publication =
                    with_spinner(cli.quiet, "Looking up paper...", api.get_paper(&paper))
                        .await
                        .with_context(|| format!("Failed to fetch paper {}", paper))?;
                publication.link
            };

            let answer = with_spinner(cli.quiet, "Thinking...", chat.ask_about(&link, &question))
                .await
                .context("Chatbot request failed")?;

            match resolve_format(cli.output) {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&answer)?);
                }
                _ => ui::print_paper_answer(&answer),
            }
        }

        Some(Commands::Cache { command }) => {
            let cache = DiskCache::from_config(&config.cache);
            cache.initialize()?;

            match command {
                CacheCommands::Status => {
                    let stats = cache.stats();
                    if !stats.enabled {
                        println!("Cache: disabled");
                        println!("To enable, set cache.enabled = true in the config file");
                    } else {
                        println!("Cache: enabled");
                        println!("Directory: {}", stats.cache_dir.display());
                        println!(
                            "Pages: {} entries ({} KB)",
                            stats.entry_count,
                            ui::format_number(stats.size_kb)
                        );
                    }
                }
                CacheCommands::Clear => {
                    if !cli.quiet {
                        eprintln!("Clearing cached pages...");
                    }
                    cache.clear_all();
                    if !cli.quiet {
                        eprintln!("Cache cleared successfully.");
                    }
                }
            }
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init => unreachable!("handled before config loading"),
            ConfigCommands::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        },

        None => {
            // No command provided - show help
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  browse             - Browse the publication listing");
            println!("  search <query>     - Search publications");
            println!("  paper <id>         - Show one publication");
            println!("  ask <question>     - Ask the corpus chatbot");
        }
    }

    Ok(())
}

/// Drive the listing controller through one command and print the result.
async fn show_listing(
    config: &Config,
    query: Option<&str>,
    page: u32,
    format: OutputFormat,
    quiet: bool,
    no_cache: bool,
) -> Result<()> {
    let api: Arc<dyn PublicationApi> = Arc::new(GardApi::from_config(&config.api));

    let mut cache_config = config.cache.clone();
    if no_cache {
        cache_config.enabled = false;
    }
    let cache = DiskCache::from_config(&cache_config);
    cache.initialize()?;

    let mut controller = ListingController::new(api, Arc::new(cache));
    controller.on_event(|event| match event {
        ListingEvent::Updated(snapshot) => tracing::debug!(
            "Listing updated: page {}/{} ({} items, loading={})",
            snapshot.page,
            snapshot.total_pages,
            snapshot.items.len(),
            snapshot.loading
        ),
        ListingEvent::ScrollToTop => tracing::trace!("Scroll to top requested"),
    });

    let spinner = (!quiet && ui::is_terminal()).then(|| ui::Spinner::new("Fetching publications..."));

    let outcome = async {
        match query {
            Some(q) => {
                controller.set_query(q);
                controller.search().await?;
            }
            None => controller.initialize().await?,
        }
        if page > 1 {
            if let Some(s) = &spinner {
                s.set_message(&format!("Fetching page {}...", page));
            }
            controller.go_to_page(page).await?;
        }
        Ok::<_, ApiError>(())
    }
    .await;

    match &spinner {
        Some(s) if outcome.is_ok() => s.finish_and_clear(),
        Some(s) => s.finish_with_error("Fetch failed"),
        None => {}
    }
    outcome.context("Failed to fetch publications")?;

    if page != controller.page() && !quiet {
        eprintln!(
            "Page {} is out of range, showing page {} of {}.",
            page,
            controller.page(),
            controller.total_pages()
        );
    }

    output_listing(&controller, format);
    Ok(())
}

/// Run `fut` behind a spinner when stdout is a terminal.
async fn with_spinner<T, F>(quiet: bool, msg: &str, fut: F) -> Result<T, ApiError>
where
    F: std::future::Future<Output = Result<T, ApiError>>,
{
    let spinner = (!quiet && ui::is_terminal()).then(|| ui::Spinner::new(msg));
    let result = fut.await;
    match &spinner {
        Some(s) if result.is_ok() => s.finish_and_clear(),
        Some(s) => s.finish_with_error("Request failed"),
        None => {}
    }
    result
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if ui::is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn output_listing(controller: &ListingController, format: OutputFormat) {
    match resolve_format(format) {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "papers": controller.items(),
                "page": controller.page(),
                "total_pages": controller.total_pages(),
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        }
        OutputFormat::Plain => {
            if controller.items().is_empty() {
                println!("No publications found.");
                return;
            }
            for publication in controller.items() {
                println!(
                    "{} - {} ({})",
                    publication.id, publication.title, publication.year
                );
                println!("  {}", publication.link);
                println!();
            }
            println!("Page {} of {}", controller.page(), controller.total_pages());
        }
        OutputFormat::Table => {
            if controller.items().is_empty() {
                println!("No publications found.");
                return;
            }

            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Id", "Title", "Authors", "Year"]);

            for publication in controller.items() {
                table.add_row(vec![
                    Cell::new(&publication.id),
                    Cell::new(ui::truncate_with_ellipsis(&publication.title, 60))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(
                        &publication.authors.join(", "),
                        30,
                    )),
                    Cell::new(&publication.year),
                ]);
            }
            println!("{table}");
            println!(
                "Page {} of {}   {}",
                controller.page(),
                controller.total_pages(),
                ui::render_page_strip(&controller.page_links(), controller.page())
            );
        }
        OutputFormat::Auto => unreachable!(),
    }
}
