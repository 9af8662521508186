use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinylink::{
    auth::{AuthClient, AuthRequest, CredentialSlot, RegistrationProfile},
    config::AppConfig,
    stats::{ClickBreakdown, StatsSummary},
    telemetry::Telemetry,
    JsonFileStore, LinkService, NewLink, RecordStore, RedirectResolver, Resolution, Visit,
};

#[derive(Parser)]
#[command(name = "tinylink", version, about = "Shorten URLs into a local link file")]
struct Cli {
    /// Record file (overrides DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Base URL for generated links (overrides BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a short link
    Shorten {
        url: String,
        /// Custom shortcode (letters and digits only)
        #[arg(long)]
        code: Option<String>,
        /// Minutes the link stays valid (1-10080)
        #[arg(long)]
        validity: Option<i64>,
    },
    /// Resolve a shortcode and record the visit
    Open {
        code: String,
        #[arg(long, default_value = "cli")]
        source: String,
        #[arg(long, default_value = concat!("tinylink/", env!("CARGO_PKG_VERSION")))]
        user_agent: String,
        /// Print the destination without waiting out the redirect delay
        #[arg(long)]
        no_wait: bool,
    },
    /// Show every link, or click details for one
    Stats { code: Option<String> },
    /// Register with the evaluation service
    Register(RegisterArgs),
    /// Obtain and store an access token
    Auth(AuthArgs),
    /// Forget the stored access token
    Logout,
    /// Show where links and credentials live and whether logs are shipped
    Status,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    mobile_no: String,
    #[arg(long)]
    github_username: String,
    #[arg(long)]
    roll_no: String,
    #[arg(long)]
    access_code: String,
}

#[derive(Args)]
struct AuthArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    roll_no: String,
    #[arg(long)]
    access_code: String,
    #[arg(long)]
    client_id: String,
    #[arg(long)]
    client_secret: String,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env; env vars may already be set, so a missing file is fine
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinylink=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    if let Some(url) = cli.base_url {
        config.base_url = url.trim_end_matches('/').to_owned();
    }
    tracing::debug!("Using record file {}", config.data_file.display());

    let credentials = CredentialSlot::new(&config.token_file);
    let token = credentials.load().unwrap_or_else(|e| {
        tracing::warn!("Could not read access token: {}", e);
        None
    });
    let telemetry = Telemetry::new(&config.eval_service_url, token);

    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::new(&config.data_file));

    let result = run(cli.command, &config, store, &credentials, &telemetry).await;

    telemetry.flush(Duration::from_secs(3)).await;
    result
}

async fn run(
    command: Command,
    config: &AppConfig,
    store: Arc<dyn RecordStore>,
    credentials: &CredentialSlot,
    telemetry: &Telemetry,
) -> anyhow::Result<()> {
    let links = LinkService::new(store.clone(), &config.base_url)
        .with_default_validity(config.default_validity_minutes)
        .with_telemetry(telemetry.clone());

    match command {
        Command::Shorten {
            url,
            code,
            validity,
        } => {
            let link = NewLink {
                long_url: url,
                custom_code: code,
                validity_minutes: validity,
            };

            let record = links
                .create(link)
                .map_err(|e| anyhow::anyhow!("{} ({})", e, e.field()))?;

            println!("{}", record.short_url);
            println!(
                "expires {}",
                record.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }

        Command::Open {
            code,
            source,
            user_agent,
            no_wait,
        } => {
            let resolver = RedirectResolver::new(store)
                .with_telemetry(telemetry.clone())
                .with_delay(config.redirect_delay);

            match resolver.resolve(&code, &Visit::new(source, user_agent)) {
                Resolution::Found { long_url, delay } => {
                    if !no_wait && !delay.is_zero() {
                        eprintln!("Redirecting to {long_url} ...");
                        tokio::time::sleep(delay).await;
                    }
                    println!("{long_url}");
                }
                Resolution::Expired { long_url } => {
                    anyhow::bail!("This short URL has expired. Original URL was: {long_url}");
                }
                Resolution::NotFound { shortcode } => {
                    anyhow::bail!("Short URL not found: {shortcode}");
                }
                Resolution::Error { message } => anyhow::bail!(message),
            }
        }

        Command::Stats { code: None } => {
            let summary = StatsSummary::collect(links.list(), Utc::now());
            if summary.rows.is_empty() {
                println!("No URLs found.");
                return Ok(());
            }

            println!(
                "{} link(s), {} active, {} click(s)",
                summary.total_links, summary.active_links, summary.total_clicks
            );
            for row in &summary.rows {
                let r = &row.record;
                println!(
                    "{:<8} {:<7} {:>5}  {}  -> {}",
                    r.shortcode,
                    row.status.as_str(),
                    r.clicks,
                    r.short_url,
                    r.long_url
                );
            }
        }

        Command::Stats { code: Some(code) } => {
            let record = links
                .get(&code)
                .with_context(|| format!("Short URL not found: {code}"))?;
            let breakdown = ClickBreakdown::for_record(&record);

            println!("{} -> {}", record.short_url, record.long_url);
            println!(
                "created {}  expires {}  clicks {}",
                record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                record.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                record.clicks
            );
            print_breakdown("Sources", &breakdown.top_sources);
            print_breakdown("Browsers", &breakdown.top_browsers);
            print_breakdown("OS", &breakdown.top_os);

            for click in &record.click_details {
                println!(
                    "  {}  {}  {}",
                    click.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    click.source,
                    click.user_agent
                );
            }
        }

        Command::Register(args) => {
            let client = AuthClient::new(&config.eval_service_url)?;
            let creds = client
                .register(&RegistrationProfile {
                    email: args.email,
                    name: args.name,
                    mobile_no: args.mobile_no,
                    github_username: args.github_username,
                    roll_no: args.roll_no,
                    access_code: args.access_code,
                })
                .await
                .context("Registration failed")?;

            println!("clientID:     {}", creds.client_id);
            println!("clientSecret: {}", creds.client_secret);
        }

        Command::Auth(args) => {
            let client = AuthClient::new(&config.eval_service_url)?;
            let token = client
                .authenticate(&AuthRequest {
                    email: args.email,
                    name: args.name,
                    roll_no: args.roll_no,
                    access_code: args.access_code,
                    client_id: args.client_id,
                    client_secret: args.client_secret,
                })
                .await
                .context("Authentication failed")?;

            credentials
                .store(&token.access_token)
                .with_context(|| format!("writing {}", credentials.path().display()))?;
            println!("Authenticated, token stored in {}", credentials.path().display());
        }

        Command::Logout => {
            credentials.clear()?;
            println!("Access token removed");
        }

        Command::Status => {
            let records = store
                .load()
                .with_context(|| format!("reading {}", config.data_file.display()))?;

            println!("records:   {} ({} link(s))", config.data_file.display(), records.len());
            println!("base url:  {}", links.base_url());
            println!(
                "token:     {} ({})",
                credentials.path().display(),
                if credentials.is_authenticated() { "present" } else { "missing" }
            );
            println!(
                "telemetry: {}",
                if telemetry.is_remote() {
                    config.eval_service_url.as_str()
                } else {
                    "local only"
                }
            );
        }
    }

    Ok(())
}

fn print_breakdown(title: &str, rows: &[(String, u64, u64)]) {
    if rows.is_empty() {
        return;
    }
    println!("{title}:");
    for (name, count, pct) in rows {
        println!("  {count:>5} {pct:>3}%  {name}");
    }
}
