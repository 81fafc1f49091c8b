use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use meme_arena_client::{
    App,
    domain::ImageFile,
    routes::Route,
    vote::VoteDirection,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse, vote on and upload memes")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the top memes.
    List,
    /// Open a meme's detail view.
    Show { id: String },
    /// Vote on a meme. Voting the same way twice removes the vote.
    Vote { id: String, direction: Direction },
    /// Delete a meme (admins only).
    Delete { id: String },
    /// Upload a JPG or PNG image.
    Upload { title: String, path: PathBuf },
    Login { username: String, password: String },
    Register { username: String, password: String, email: String },
    Logout,
    Whoami,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for VoteDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => VoteDirection::Up,
            Direction::Down => VoteDirection::Down,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_arena_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut app = App::from_env().context("Failed to initialize client")?;
    tracing::info!(base_url = %app.config().api_base_url, "Client ready");

    match args.command {
        Command::List => {
            app.start(Route::Home).await;
        }
        Command::Show { id } => {
            app.start(Route::Meme(id)).await;
        }
        Command::Vote { id, direction } => {
            app.start(Route::Meme(id)).await;
            if let Err(e) = app.vote(direction.into()).await {
                eprintln!("{}", e);
            }
        }
        Command::Delete { id } => {
            app.start(Route::Meme(id)).await;
            match app.delete_selected().await {
                Ok(id) => println!("Deleted {}", id),
                Err(e) => eprintln!("{}", e),
            }
        }
        Command::Upload { title, path } => {
            app.start(Route::Home).await;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file = ImageFile {
                file_name,
                content_type: None,
                bytes,
            };
            let form_ok = app.upload_form().set_title(&title).is_ok() && app.select_upload_file(file).is_ok();
            if form_ok {
                match app.submit_upload().await {
                    Ok(route) => println!("Uploaded, see {}", route),
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
        Command::Login { username, password } => {
            app.start(Route::Login).await;
            if !app.login(&username, &password).await {
                eprintln!("Invalid username or password");
            }
        }
        Command::Register { username, password, email } => {
            app.start(Route::Login).await;
            if !app.register(&username, &password, &email).await {
                eprintln!("Registration failed, the username may already be taken");
            }
        }
        Command::Logout => {
            app.logout().await;
            println!("Logged out");
            return Ok(());
        }
        Command::Whoami => {
            app.start(Route::Login).await;
        }
    }

    println!("{}", app.render().await);
    Ok(())
}
