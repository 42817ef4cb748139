//! filedeck CLI: browse and edit the configured storage from a terminal.
//!
//! Configuration comes from the environment (or `.env`), see
//! `FileManagerConfig::from_env`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filedeck_browser::{BrowserContext, FileBrowser};
use filedeck_cli::{error_reports, file_name, init_tracing};
use filedeck_core::{DisplayMode, FileManagerConfig, SortKey, UploadCandidate};
use filedeck_processing::{CropRect, ImageTransformer};
use filedeck_storage::create_storage;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "filedeck", about = "File browser over local, S3 or in-memory storage")]
struct Cli {
    /// Category to browse (file, image, ...)
    #[arg(long = "type", global = true)]
    category: Option<String>,
    /// User slug owning the private folder
    #[arg(long, global = true, default_value = "default")]
    user: String,
    /// Working directory (e.g. /default/holiday)
    #[arg(long, global = true)]
    dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the private and shared root folders
    Init,
    /// Show root folders and their sub-folders
    Tree,
    /// List folders and files of the working directory
    List {
        /// name or time
        #[arg(long, default_value = "name")]
        sort: String,
        #[arg(long, default_value = "1")]
        page: usize,
        /// Override the display mode: grid or list
        #[arg(long)]
        display: Option<String>,
    },
    /// Upload a local file into the working directory
    Upload {
        file: PathBuf,
        /// MIME type, guessed from the file name when absent
        #[arg(long)]
        mime: Option<String>,
    },
    /// Create a folder
    Mkdir { name: String },
    /// Delete files or empty folders
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Rename a file or folder
    Rename { old: String, new: String },
    /// Move items into another working directory
    Move {
        #[arg(required = true)]
        names: Vec<String>,
        /// Target working directory
        #[arg(long)]
        to: String,
    },
    /// Write a file's content to a local path
    Download { name: String, output: PathBuf },
    /// Crop an image
    Crop {
        name: String,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Replace the original instead of writing a copy
        #[arg(long)]
        overwrite: bool,
    },
    /// Resize an image
    Resize {
        name: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long)]
        overwrite: bool,
    },
    /// Show the original and preview size of an image
    Preview { name: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Arc::new(FileManagerConfig::from_env().context("Failed to load configuration")?);
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    let mut context = BrowserContext::new(&config, cli.category.as_deref(), cli.user.as_str());
    if let Some(dir) = cli.dir {
        context = context.in_working_dir(dir);
    }
    if let Commands::List {
        display: Some(display),
        ..
    } = &cli.command
    {
        context = context.with_display(display.parse::<DisplayMode>()?);
    }

    let browser = FileBrowser::new(
        config.clone(),
        storage,
        Arc::new(ImageTransformer::new()),
        context,
    );

    match cli.command {
        Commands::Init => {
            browser.ensure_default_folders().await?;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::Tree => {
            print_json(&browser.root_folders().await?)?;
        }
        Commands::List { sort, page, .. } => {
            let sort = sort.parse::<SortKey>()?;
            print_json(&browser.list_items(sort, page).await?)?;
        }
        Commands::Upload { file, mime } => {
            let name = file_name(&file).context("Upload path has no file name")?;
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mime = mime.unwrap_or_else(|| {
                mime_guess::from_path(&file)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

            let candidate = UploadCandidate::new(name, mime, data.len() as u64);
            let stored = browser.upload(&candidate, data).await?;
            print_json(&serde_json::json!({ "name": stored }))?;
        }
        Commands::Mkdir { name } => {
            browser.create_folder(&name).await?;
            print_json(&serde_json::json!({ "success": true, "name": name }))?;
        }
        Commands::Delete { names } => {
            let errors = browser.delete(&names).await;
            print_json(&serde_json::json!({
                "success": errors.is_empty(),
                "errors": error_reports(&errors),
            }))?;
        }
        Commands::Rename { old, new } => {
            let name = browser.rename(&old, &new).await?;
            print_json(&serde_json::json!({ "name": name }))?;
        }
        Commands::Move { names, to } => {
            let errors = browser.move_items(&names, &to).await;
            print_json(&serde_json::json!({
                "success": errors.is_empty(),
                "errors": error_reports(&errors),
            }))?;
        }
        Commands::Download { name, output } => {
            let (data, mime_type) = browser.download(&name).await?;
            tokio::fs::write(&output, &data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            print_json(&serde_json::json!({
                "path": output.display().to_string(),
                "mime_type": mime_type,
                "size": data.len(),
            }))?;
        }
        Commands::Crop {
            name,
            x,
            y,
            width,
            height,
            overwrite,
        } => {
            let rect = CropRect {
                x,
                y,
                width,
                height,
            };
            let stored = browser.crop(&name, rect, overwrite).await?;
            print_json(&serde_json::json!({ "name": stored }))?;
        }
        Commands::Resize {
            name,
            width,
            height,
            overwrite,
        } => {
            let stored = browser.resize(&name, width, height, overwrite).await?;
            print_json(&serde_json::json!({ "name": stored }))?;
        }
        Commands::Preview { name } => {
            print_json(&browser.resize_preview(&name).await?)?;
        }
    }

    Ok(())
}
