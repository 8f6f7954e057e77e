use clap::{Parser, Subcommand};

use crate::domain::ClientError;
use crate::frameworks::app::ImageFeedApp;
use crate::frameworks::config::Settings;
use crate::use_cases::{PageFetch, code_from_redirect};

#[derive(Parser)]
#[command(name = "image_feed", about = "Browse and like photos from the Unsplash feed")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the page to open in a browser to grant access
    AuthorizeUrl,
    /// Exchange an authorization code (or the redirect URL carrying it) for a token
    Login {
        #[arg(long, conflicts_with = "redirect", required_unless_present = "redirect")]
        code: Option<String>,
        #[arg(long)]
        redirect: Option<String>,
    },
    /// Show the signed-in user's profile
    Profile,
    /// List photos from the feed
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Like a photo
    Like { photo_id: String },
    /// Remove a like from a photo
    Unlike { photo_id: String },
    /// Forget the stored token
    Logout,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    tracing::debug!(
        api_host = %settings.endpoints.api_host,
        token_store = %settings.token_store_path.display(),
        "client configured."
    );

    let app = match ImageFeedApp::from_settings(&settings) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            std::process::exit(2);
        }
    };

    if let Err(e) = execute(&app, cli.command).await {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn execute(app: &ImageFeedApp, command: Command) -> Result<(), ClientError> {
    match command {
        Command::AuthorizeUrl => {
            println!("{}", app.authorization_url()?);
        }
        Command::Login { code, redirect } => {
            let code = match (code, redirect) {
                (Some(code), _) => code,
                (None, Some(redirect)) => code_from_redirect(&redirect).ok_or_else(|| {
                    ClientError::InvalidRequest("redirect URL carries no authorization code".into())
                })?,
                (None, None) => {
                    return Err(ClientError::InvalidRequest("no authorization code".into()));
                }
            };
            let profile = app.login(&code).await?;
            println!("signed in as {} ({})", profile.display_name, profile.login_handle);
        }
        Command::Profile => {
            let profile = app.restore_session().await?;
            println!("{} {}", profile.display_name, profile.login_handle);
            if !profile.bio.is_empty() {
                println!("{}", profile.bio);
            }
            if let Some(avatar) = app.profile.avatar_url() {
                println!("avatar: {avatar}");
            }
        }
        Command::Feed { pages } => {
            for _ in 0..pages {
                match app.feed.fetch_next_page().await {
                    PageFetch::Failed(err) => return Err(err),
                    PageFetch::Loaded { page, old_count, new_count } => {
                        tracing::debug!(page, old_count, new_count, "page loaded");
                    }
                    PageFetch::AlreadyInFlight | PageFetch::Discarded => {}
                }
            }
            for photo in app.feed.photos() {
                let liked = if photo.is_liked { "♥" } else { " " };
                let created = photo
                    .created_at
                    .map(|date| date.format("%-d %B %Y").to_string())
                    .unwrap_or_default();
                println!(
                    "{liked} {} {}x{} {created} {}",
                    photo.id, photo.size.width, photo.size.height, photo.thumb_url
                );
            }
        }
        Command::Like { photo_id } => {
            app.feed.change_like(&photo_id, true).await?;
            println!("liked {photo_id}");
        }
        Command::Unlike { photo_id } => {
            app.feed.change_like(&photo_id, false).await?;
            println!("unliked {photo_id}");
        }
        Command::Logout => {
            app.logout()?;
            println!("signed out");
        }
    }
    Ok(())
}
