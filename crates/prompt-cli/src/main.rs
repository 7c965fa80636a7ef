use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use prompt_core::{Item, ParentRef, PromptFilter};
use prompt_store::{LibraryConfig, PromptLibrary};
use std::path::PathBuf;

mod logging;
mod render;

use logging::init_logging;

#[derive(Parser)]
#[command(name = "prompt-cli")]
#[command(about = "Organise, version and improve prompts from the terminal")]
#[command(version)]
struct Cli {
    /// Library directory (defaults to ~/.prompt-library)
    #[arg(long, env = "PROMPT_LIBRARY_DIR")]
    data_dir: Option<PathBuf>,

    /// Library owner
    #[arg(long, short, env = "PROMPT_LIBRARY_USER", default_value = "default")]
    user: String,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all folders and prompts
    Tree,
    /// Create a folder
    FolderAdd {
        name: String,
        /// Parent folder id, or "root"
        #[arg(long, default_value = "root")]
        parent: String,
    },
    /// Create a prompt from an argument or a file
    Add {
        name: String,
        content: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "root")]
        parent: String,
    },
    /// Replace a prompt's content, archiving the previous version
    Edit {
        id: String,
        content: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a prompt
    Show { id: String },
    /// List every version of a prompt
    History { id: String },
    /// Bring back the text of an earlier version
    Restore { id: String, version: u32 },
    /// Duplicate a prompt without its history
    Branch { id: String },
    /// Move a prompt or folder
    Mv {
        id: String,
        /// Target folder id, or "root"
        parent: String,
    },
    /// Rename a prompt or folder
    Rename { id: String, name: String },
    /// Toggle the favourite flag of a prompt
    Fav { id: String },
    /// Delete a prompt or an empty folder
    Rm { id: String },
    /// List folders with their breadcrumb paths
    Folders {
        /// Leave out this folder's own entry
        #[arg(long, conflicts_with = "target_of")]
        exclude: Option<String>,
        /// Include the top level as an option
        #[arg(long)]
        root: bool,
        /// Only folders this item could be moved into
        #[arg(long = "for", value_name = "ID")]
        target_of: Option<String>,
    },
    /// Search prompts by name or content
    Search {
        query: Option<String>,
        #[arg(long)]
        favorites: bool,
        /// Only prompts directly in this folder id, or "root"
        #[arg(long)]
        folder: Option<String>,
    },
    /// Export the library as JSON
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import prompts from a JSON export or a list of {name, content}
    Import {
        file: PathBuf,
        #[arg(long, default_value = "root")]
        parent: String,
    },
    /// Ask the configured model for improvement ideas
    Suggest { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match &cli.data_dir {
        Some(dir) => LibraryConfig::load_from(dir, |key| std::env::var(key).ok()),
        None => LibraryConfig::load(),
    };
    log::debug!("Using library at {:?} for user {}", config.data_dir, cli.user);

    let library = PromptLibrary::from_config(&config);
    run(&library, &cli.user, cli.command).await
}

async fn run(library: &PromptLibrary, user: &str, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Tree => render::print_tree(&library.tree(user).await?),
        Commands::FolderAdd { name, parent } => {
            let folder = library
                .create_folder(user, &name, &ParentRef::from(parent))
                .await?;
            println!("{} folder {}", "Created".green(), folder.id);
        }
        Commands::Add {
            name,
            content,
            file,
            parent,
        } => {
            let content = read_content(content, file)?;
            let prompt = library
                .create_prompt(user, &name, &content, &ParentRef::from(parent))
                .await?;
            println!("{} prompt {}", "Created".green(), prompt.id);
        }
        Commands::Edit { id, content, file } => {
            let before = library.get_prompt(user, &id).await?.version_number;
            let content = read_content(content, file)?;
            let prompt = library.update_content(user, &id, &content).await?;
            if prompt.version_number == before {
                println!("{}", "Content unchanged, no new version".dimmed());
            } else {
                println!("{} v{}", "Saved".green(), prompt.version_number);
            }
        }
        Commands::Show { id } => render::print_prompt(&library.get_prompt(user, &id).await?),
        Commands::History { id } => {
            render::print_versions(&library.list_versions(user, &id).await?)
        }
        Commands::Restore { id, version } => {
            let prompt = library.restore_version(user, &id, version).await?;
            println!(
                "{} v{} as v{}",
                "Restored".green(),
                version,
                prompt.version_number
            );
        }
        Commands::Branch { id } => {
            let prompt = library.branch_prompt(user, &id).await?;
            println!("{} {} ({})", "Branched".green(), prompt.name, prompt.id);
        }
        Commands::Mv { id, parent } => {
            let item = library
                .move_item(user, &id, &ParentRef::from(parent))
                .await?;
            println!("{} {} to {}", "Moved".green(), item.name(), item.parent_id());
        }
        Commands::Rename { id, name } => {
            let item = library.rename(user, &id, &name).await?;
            println!("{} {}", "Renamed to".green(), item.name());
        }
        Commands::Fav { id } => {
            let prompt = library.toggle_favorite(user, &id).await?;
            let state = if prompt.is_favorite { "Starred" } else { "Unstarred" };
            println!("{} {}", state.yellow(), prompt.name);
        }
        Commands::Rm { id } => {
            let item = library.get_item(user, &id).await?;
            library.delete_item(user, &id).await?;
            let kind = match item {
                Item::Folder(_) => "folder",
                Item::Prompt(_) => "prompt",
            };
            println!("{} {} {}", "Deleted".red(), kind, item.name());
        }
        Commands::Folders {
            exclude,
            root,
            target_of,
        } => {
            let options = match target_of {
                Some(id) => library.move_targets(user, &id).await?,
                None => {
                    library
                        .folder_options(user, exclude.as_deref(), root)
                        .await?
                }
            };
            render::print_folder_options(&options);
        }
        Commands::Search {
            query,
            favorites,
            folder,
        } => {
            let mut filter = PromptFilter::new();
            if let Some(query) = query {
                filter = filter.with_search(query);
            }
            if favorites {
                filter = filter.favorites_only();
            }
            if let Some(folder) = folder {
                filter = filter.in_folder(ParentRef::from(folder));
            }
            render::print_prompt_list(&library.list_prompts(user, &filter).await?);
        }
        Commands::Export { output } => {
            let json = library.export_json(user).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("{} {:?}", "Exported to".green(), path);
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file, parent } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let count = library
                .import_json(user, &json, &ParentRef::from(parent))
                .await?;
            println!("{} {} prompts", "Imported".green(), count);
        }
        Commands::Suggest { id } => {
            let suggestions = library.suggest_improvements(user, &id).await?;
            if suggestions.is_empty() {
                println!("{}", "No suggestions returned".dimmed());
            }
            for (index, suggestion) in suggestions.iter().enumerate() {
                println!("{} {}", format!("{}.", index + 1).cyan(), suggestion);
            }
        }
    }
    Ok(())
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    match (content, file) {
        (Some(_), Some(_)) => bail!("Pass content either inline or with --file, not both"),
        (Some(content), None) => Ok(content),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path)),
        (None, None) => bail!("No content given; pass it inline or with --file"),
    }
}
