use clap::{Args, Parser, Subcommand};

use crate::reader::Direction;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Store file (default: $MANHUWA_SHELF_STORE, then `manhuwa-shelf.json`).
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Base URL of the scrape api (default: $MANHUWA_SHELF_API_URL, then
    /// `http://127.0.0.1:3000`).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage registered source sites.
    Site {
        #[command(subcommand)]
        command: SiteCommand,
    },
    /// Search, bookmark and remove titles.
    Title {
        #[command(subcommand)]
        command: TitleCommand,
    },
    /// Chapter lists of bookmarked titles.
    Chapter {
        #[command(subcommand)]
        command: ChapterCommand,
    },
    /// Show the selected chapter's page images.
    Read(ReadArgs),
    /// Inspect, export and import the raw store.
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SiteCommand {
    Add(SiteAddArgs),
    List,
    Remove(SiteRemoveArgs),
}

#[derive(Debug, Args)]
pub struct SiteAddArgs {
    /// Site URL (must be an absolute URL).
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct SiteRemoveArgs {
    #[arg(long)]
    pub id: u64,
}

#[derive(Debug, Subcommand)]
pub enum TitleCommand {
    Search(TitleSearchArgs),
    Add(TitleAddArgs),
    List,
    Remove(TitleRemoveArgs),
}

#[derive(Debug, Args)]
pub struct TitleSearchArgs {
    /// Title name to search for on every registered site.
    #[arg(long)]
    pub name: String,

    /// Bookmark the result with this link.
    #[arg(long, value_name = "LINK")]
    pub add: Option<String>,
}

#[derive(Debug, Args)]
pub struct TitleAddArgs {
    /// Title page URL on the source site.
    #[arg(long)]
    pub link: String,

    #[arg(long)]
    pub name: String,

    /// Cover image URL.
    #[arg(long, default_value = "")]
    pub src: String,

    /// Title of the site the result came from.
    #[arg(long, default_value = "")]
    pub source_site: String,
}

#[derive(Debug, Args)]
pub struct TitleRemoveArgs {
    #[arg(long)]
    pub link: String,
}

#[derive(Debug, Subcommand)]
pub enum ChapterCommand {
    List(ChapterListArgs),
    Select(ChapterSelectArgs),
    Remove(ChapterRemoveArgs),
}

#[derive(Debug, Args)]
pub struct ChapterListArgs {
    /// Link of a bookmarked title.
    #[arg(long)]
    pub link: String,

    /// Fetch the chapter list even when it is cached.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("chapter").required(true).args(["href", "text"])))]
pub struct ChapterSelectArgs {
    #[arg(long)]
    pub link: String,

    /// Chapter URL.
    #[arg(long)]
    pub href: Option<String>,

    /// Chapter label, compared ignoring case and whitespace.
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChapterRemoveArgs {
    #[arg(long)]
    pub link: String,

    #[arg(long)]
    pub href: String,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Link of a bookmarked title.
    #[arg(long)]
    pub link: String,

    /// Move to the previous or next chapter before reading.
    #[arg(long, value_enum)]
    pub go: Option<Direction>,

    /// Fetch the images again, replacing the cached list.
    #[arg(long, default_value_t = false)]
    pub refetch: bool,
}

#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    Export(StoreExportArgs),
    Import(StoreImportArgs),
    List,
    Remove(StoreRemoveArgs),
}

#[derive(Debug, Args)]
pub struct StoreExportArgs {
    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite the output file if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct StoreImportArgs {
    /// JSON document produced by `store export`. Replaces the whole store.
    #[arg(long)]
    pub input: String,
}

#[derive(Debug, Args)]
pub struct StoreRemoveArgs {
    /// Raw store key.
    #[arg(long)]
    pub key: String,
}
