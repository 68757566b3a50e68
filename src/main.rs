use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use gitbook_cli::config::Config;
use gitbook_cli::logging;
use gitbook_cli::manager::{Manager, UpdateOutcome};
use gitbook_cli::store::InstalledVersion;
use gitbook_cli::version::rule::ANY;
use gitbook_cli::version::tags::Tag;
use gitbook_cli::version::types::RemoteCatalog;

#[derive(Parser)]
#[command(name = "gitbook")]
#[command(version, about = "Manage the GitBook versions used to build books")]
struct Cli {
    /// GitBook version to use instead of the one declared in book.json
    #[arg(short = 'v', long = "gitbook", global = true)]
    gitbook: Option<String>,

    /// Book root directory (defaults to the current directory)
    #[arg(short = 'b', long = "book", global = true)]
    book: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List versions installed locally
    #[command(visible_alias = "list")]
    Ls,

    /// List remote versions available for install
    #[command(name = "ls-remote", visible_alias = "list-remote")]
    LsRemote,

    /// Download and install a version, range or tag
    Fetch {
        #[arg(default_value = ANY)]
        version: String,
    },

    /// Set an alias named <name> pointing to <folder>
    Alias {
        folder: Option<PathBuf>,
        #[arg(default_value = "latest")]
        name: String,
    },

    /// Uninstall a version
    Uninstall { name: String },

    /// Update to the version published under <tag>
    Update {
        #[arg(default_value = "latest")]
        tag: String,
    },

    /// Display the version used by the book
    Current,

    /// Display running versions of gitbook and this tool
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env();
    config
        .init()
        .with_context(|| format!("failed to initialize {}", config.root.display()))?;
    let _guard = logging::init(&config.log_path(), cli.debug)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let manager = Manager::from_config(&config)?;
    let book_root = match cli.book {
        Some(book) => book,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    match cli.command {
        Command::Ls => print_installed(&manager.store().list()?),
        Command::LsRemote => print_remote(&manager.remote_versions().await?),
        Command::Fetch { version } => {
            let installed = manager.install(&version).await?;
            println!();
            println!("GitBook {} has been installed", installed);
        }
        Command::Alias { folder, name } => {
            let folder = match folder {
                Some(folder) => folder,
                None => std::env::current_dir()?,
            };
            let folder = std::path::absolute(&folder)?;
            manager.store().link(&name, &folder)?;
            println!("GitBook {} point to {}", name, folder.display());
        }
        Command::Uninstall { name } => {
            manager.store().remove(&name)?;
            println!("GitBook {} has been uninstalled.", name);
        }
        Command::Update { tag } => match manager.update_version(Some(&tag)).await? {
            UpdateOutcome::Updated { version, .. } => {
                println!();
                println!("GitBook has been updated to {}", version);
            }
            UpdateOutcome::UpToDate { .. } => println!("No update found!"),
        },
        Command::Current => {
            let version = ensure(&manager, &book_root, cli.gitbook.as_deref()).await?;
            println!("GitBook version is {}", display_version(&version));
        }
        Command::Version => {
            println!("CLI version: {}", env!("CARGO_PKG_VERSION"));
            let version = ensure(&manager, &book_root, cli.gitbook.as_deref()).await?;
            println!("GitBook version: {}", display_version(&version));
        }
    }

    Ok(())
}

async fn ensure(
    manager: &Manager,
    book_root: &Path,
    version: Option<&str>,
) -> anyhow::Result<InstalledVersion> {
    Ok(manager.ensure_version(book_root, version, true).await?)
}

fn display_version(version: &InstalledVersion) -> String {
    if version.name == version.version {
        version.name.clone()
    } else {
        format!("{} ({})", version.name, version.version)
    }
}

fn print_installed(versions: &[InstalledVersion]) {
    if versions.is_empty() {
        println!("There is no versions installed");
        println!("You can install the latest version using: \"gitbook fetch\"");
        return;
    }

    println!("GitBook Versions Installed:");
    println!();
    for (i, version) in versions.iter().enumerate() {
        let mut text = version.name.clone();
        if version.name != version.version {
            text.push_str(&format!(" [{}]", version.version));
        }
        if let Some(link) = &version.link {
            text.push_str(&format!(" (alias of {})", link.display()));
        }
        let marker = if i == 0 { "*" } else { " " };
        println!("   {} {}", marker, text);
    }
    println!();
    println!(
        "Run \"gitbook update\" to update to the {} version.",
        Tag::STABLE
    );
}

fn print_remote(catalog: &RemoteCatalog) {
    println!("Available GitBook Versions:");
    println!();
    println!("     {}", catalog.versions.join(", "));
    println!();
    println!("Tags:");
    println!();
    for (tag, version) in &catalog.tags {
        println!("    {}: {}", tag, version);
    }
    println!();
}
