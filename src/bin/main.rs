use anyhow::{Context, Result, bail};
use authgate::auth::password::hash_password;
use authgate::config::DEFAULT_SESSION_TTL_SECONDS;
use authgate::{AuthSettings, Environment, create_app};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Cookie-session authentication service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP auth server
    Serve {
        /// Bind address, e.g. 0.0.0.0:3000
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
        /// Overrides the port of --bind when set
        #[arg(long, env = "PORT")]
        port: Option<u16>,
        /// HMAC secret for signing session tokens
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
        /// development or production (production marks cookies Secure)
        #[arg(long, env = "APP_ENV", default_value = "development")]
        environment: Environment,
        #[arg(long, env = "SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL_SECONDS)]
        session_ttl_secs: u64,
        /// Deny-list token ids on logout until they expire
        #[arg(long, env = "REVOKE_ON_LOGOUT", default_value_t = false)]
        revoke_on_logout: bool,
        /// Seed an administrator account at startup (requires --admin-password)
        #[arg(long, env = "ADMIN_EMAIL")]
        admin_email: Option<String>,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },
    /// Print an Argon2id hash for a plaintext password
    HashPassword { plaintext: String },
}

const DEFAULT_LOG_DIRECTIVES: &str = "authgate=info,tower_http=info";

/// `RUST_LOG` when set, otherwise the default directives.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(DEFAULT_LOG_DIRECTIVES),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            jwt_secret,
            environment,
            session_ttl_secs,
            revoke_on_logout,
            admin_email,
            admin_password,
        } => {
            let mut addr = bind;
            if let Some(port) = port {
                addr.set_port(port);
            }

            let settings = AuthSettings::new(jwt_secret)
                .with_environment(environment)
                .with_session_ttl(Duration::from_secs(session_ttl_secs))
                .with_revoke_on_logout(revoke_on_logout);
            info!(?settings, "Loaded auth settings");

            let (service, app) =
                create_app(&settings).context("Invalid authentication settings")?;

            match (admin_email, admin_password) {
                (Some(email), Some(password)) => {
                    service
                        .seed_admin(&email, password, "Administrator".to_string())
                        .await
                        .context("Failed to seed admin account")?;
                }
                (Some(_), None) | (None, Some(_)) => {
                    bail!("--admin-email and --admin-password must be given together");
                }
                (None, None) => {}
            }

            let accounts = service
                .store()
                .count()
                .await
                .context("Failed to read user store")?;
            info!(accounts, "User store ready");

            if !environment.is_production() {
                warn!("Running in {} mode: session cookies are not Secure", environment);
            }

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Auth server listening on http://{}", addr);

            axum::serve(listener, app).await?;
        }
        Commands::HashPassword { plaintext } => {
            let hash = tokio::task::spawn_blocking(move || hash_password(&plaintext)).await??;
            println!("{}", hash);
        }
    }

    Ok(())
}
