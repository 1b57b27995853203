use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

use manhuwa_shelf::api::HttpScrapeApi;
use manhuwa_shelf::catalog::Catalog;
use manhuwa_shelf::cli::{ChapterCommand, Cli, Command, SiteCommand, StoreCommand, TitleCommand};
use manhuwa_shelf::commands;
use manhuwa_shelf::config::ShelfConfig;
use manhuwa_shelf::kv::FileStore;
use manhuwa_shelf::shelf::Shelf;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    manhuwa_shelf::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = ShelfConfig::resolve(cli.store.as_deref(), cli.api_url.as_deref());
    tracing::debug!(?config, "resolved config");

    let store = FileStore::open(&config.store_path).context("open store")?;
    let shelf = Shelf::new(
        Catalog::new(Arc::new(store)),
        Arc::new(HttpScrapeApi::new(config.api_url)),
    );

    match cli.command {
        Command::Site {
            command: SiteCommand::Add(args),
        } => {
            commands::site_add(&shelf, args).await.context("site add")?;
        }
        Command::Site {
            command: SiteCommand::List,
        } => commands::site_list(&shelf),
        Command::Site {
            command: SiteCommand::Remove(args),
        } => commands::site_remove(&shelf, args),
        Command::Title {
            command: TitleCommand::Search(args),
        } => {
            commands::title_search(&shelf, args)
                .await
                .context("title search")?;
        }
        Command::Title {
            command: TitleCommand::Add(args),
        } => {
            commands::title_add(&shelf, args).context("title add")?;
        }
        Command::Title {
            command: TitleCommand::List,
        } => commands::title_list(&shelf),
        Command::Title {
            command: TitleCommand::Remove(args),
        } => {
            commands::title_remove(&shelf, args).context("title remove")?;
        }
        Command::Chapter {
            command: ChapterCommand::List(args),
        } => {
            commands::chapter_list(&shelf, args)
                .await
                .context("chapter list")?;
        }
        Command::Chapter {
            command: ChapterCommand::Select(args),
        } => {
            commands::chapter_select(&shelf, args).context("chapter select")?;
        }
        Command::Chapter {
            command: ChapterCommand::Remove(args),
        } => {
            commands::chapter_remove(&shelf, args).context("chapter remove")?;
        }
        Command::Read(args) => {
            commands::read(&shelf, args).await.context("read")?;
        }
        Command::Store {
            command: StoreCommand::Export(args),
        } => {
            commands::store_export(&shelf, args).context("store export")?;
        }
        Command::Store {
            command: StoreCommand::Import(args),
        } => {
            commands::store_import(&shelf, args).context("store import")?;
        }
        Command::Store {
            command: StoreCommand::List,
        } => {
            commands::store_list(&shelf).context("store list")?;
        }
        Command::Store {
            command: StoreCommand::Remove(args),
        } => {
            commands::store_remove(&shelf, args).context("store remove")?;
        }
    }

    Ok(())
}
