use std::fs::OpenOptions;
use std::io::Write as _;

use anyhow::Context as _;

use crate::backup;
use crate::catalog::AddTitle;
use crate::cli::{
    ChapterListArgs, ChapterRemoveArgs, ChapterSelectArgs, ReadArgs, SiteAddArgs, SiteRemoveArgs,
    StoreExportArgs, StoreImportArgs, StoreRemoveArgs, TitleAddArgs, TitleRemoveArgs,
    TitleSearchArgs,
};
use crate::formats::Title;
use crate::keys::StoreKey;
use crate::reader::Direction;
use crate::shelf::{ChapterSelector, Shelf};

pub async fn site_add(shelf: &Shelf, args: SiteAddArgs) -> anyhow::Result<()> {
    let site = shelf.register_site(&args.url).await?;
    println!("added site {}: {} ({})", site.id, site.site_title, site.url);
    Ok(())
}

pub fn site_list(shelf: &Shelf) {
    for site in shelf.catalog().load_sites() {
        println!(
            "{}\t{}\t{}\t{}",
            site.id, site.site_title, site.url, site.favicon_url
        );
    }
}

pub fn site_remove(shelf: &Shelf, args: SiteRemoveArgs) {
    if shelf.remove_site(args.id) {
        println!("removed site {}", args.id);
    } else {
        println!("no site with id {}", args.id);
    }
}

pub async fn title_search(shelf: &Shelf, args: TitleSearchArgs) -> anyhow::Result<()> {
    let results = shelf.search(&args.name).await?;
    let bookmarked = shelf.catalog().load_titles();

    for result in &results {
        println!("# {}", result.site_title);
        if result.hits.is_empty() {
            println!("  (no results)");
        }
        for hit in &result.hits {
            let marker = if bookmarked.iter().any(|t| t.link == hit.link) {
                '*'
            } else {
                ' '
            };
            println!("{marker} {}\t{}\t{}", hit.name, hit.link, hit.src);
        }
    }

    if results.iter().all(|r| r.hits.is_empty()) {
        println!("no results found across all sites");
    }

    if let Some(link) = args.add {
        let (title, outcome) = shelf.bookmark_hit(&results, &link)?;
        report_bookmark(&title.name, outcome)?;
    }
    Ok(())
}

pub fn title_add(shelf: &Shelf, args: TitleAddArgs) -> anyhow::Result<()> {
    let name = args.name.clone();
    let title = Title {
        link: args.link,
        name: args.name,
        src: args.src,
        source_site: args.source_site,
    };
    report_bookmark(&name, shelf.bookmark(title))
}

fn report_bookmark(name: &str, outcome: AddTitle) -> anyhow::Result<()> {
    match outcome {
        AddTitle::Added => {
            println!("added \"{name}\"");
            Ok(())
        }
        AddTitle::AlreadyBookmarked => anyhow::bail!("\"{name}\" is already added"),
        AddTitle::NotSaved => anyhow::bail!("failed to save \"{name}\""),
    }
}

pub fn title_list(shelf: &Shelf) {
    for title in shelf.catalog().load_titles() {
        println!("{}\t{}\t{}", title.name, title.link, title.source_site);
    }
}

pub fn title_remove(shelf: &Shelf, args: TitleRemoveArgs) -> anyhow::Result<()> {
    let removed = shelf.unbookmark(&args.link)?;
    println!(
        "removed {} ({} image caches)",
        args.link,
        removed.cascade.removed_images.len()
    );
    if !removed.cascade.is_complete() {
        println!(
            "warning: left behind image caches for {} chapters",
            removed.cascade.failed_images.len()
        );
    }
    Ok(())
}

pub async fn chapter_list(shelf: &Shelf, args: ChapterListArgs) -> anyhow::Result<()> {
    let view = if args.refresh {
        shelf.refresh_chapters(&args.link).await?
    } else {
        shelf.open_title(&args.link).await?
    };
    if let Some(err) = view.fetch_error {
        anyhow::bail!("load chapters for {}: {err}", args.link);
    }

    if view.chapters.is_empty() {
        println!("no chapters available");
    }
    for (index, chapter) in view.chapters.iter().enumerate() {
        println!("{index}\t{}\t{}", chapter.text, chapter.href);
    }
    Ok(())
}

pub fn chapter_select(shelf: &Shelf, args: ChapterSelectArgs) -> anyhow::Result<()> {
    let selector = match (args.href, args.text) {
        (Some(href), _) => ChapterSelector::Href(href),
        (None, Some(text)) => ChapterSelector::Text(text),
        (None, None) => anyhow::bail!("either --href or --text is required"),
    };
    let chapter = shelf.select_chapter(&args.link, &selector)?;
    println!("selected {} ({})", chapter.text, chapter.href);
    Ok(())
}

pub fn chapter_remove(shelf: &Shelf, args: ChapterRemoveArgs) -> anyhow::Result<()> {
    shelf.remove_chapter(&args.link, &args.href)?;
    println!("removed chapter {}", args.href);
    Ok(())
}

pub async fn read(shelf: &Shelf, args: ReadArgs) -> anyhow::Result<()> {
    if let Some(direction) = args.go {
        let moved = shelf.navigate(&args.link, direction)?;
        if moved.is_none() {
            match direction {
                Direction::Previous => anyhow::bail!("already at the first chapter"),
                Direction::Next => anyhow::bail!("already at the last chapter"),
            }
        }
    }

    let view = if args.refetch {
        shelf.refetch_images(&args.link).await?
    } else {
        shelf.open_chapter(&args.link).await?
    };

    println!("{} / {}", view.title.name, view.chapter.text);
    println!("url: {}", view.chapter.href);
    println!(
        "position: {}/{} ({})",
        view.index + 1,
        view.chapter_count,
        view.slug()
    );

    if let Some(err) = view.fetch_error {
        anyhow::bail!("fetch images for {}: {err}", view.chapter.href);
    }
    if view.needs_login {
        println!("this chapter may require you to be logged in; try again after logging in");
        return Ok(());
    }
    for image in &view.images {
        println!("{}", image.trim());
    }
    Ok(())
}

pub fn store_export(shelf: &Shelf, args: StoreExportArgs) -> anyhow::Result<()> {
    let store = shelf.catalog().store().as_ref();
    let Some(out) = args.out else {
        return backup::export_to_writer(store, std::io::stdout().lock());
    };

    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options
        .open(&out)
        .with_context(|| format!("open export output: {out}"))?;
    backup::export_to_writer(store, file).with_context(|| format!("write export: {out}"))?;
    println!("exported store to {out}");
    Ok(())
}

pub fn store_import(shelf: &Shelf, args: StoreImportArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read import input: {}", args.input))?;
    let summary = backup::import_from_str(shelf.catalog().store().as_ref(), &json)?;
    println!(
        "imported {} entries ({} failed)",
        summary.written, summary.failed
    );
    Ok(())
}

pub fn store_list(shelf: &Shelf) -> anyhow::Result<()> {
    let entries = backup::entries(shelf.catalog().store().as_ref())?;
    if entries.is_empty() {
        println!("store is empty");
    }
    let mut stdout = std::io::stdout().lock();
    for entry in entries {
        writeln!(
            stdout,
            "{}\t{}\t{}",
            entry.key,
            describe(&entry.kind),
            entry.value
        )
        .context("write entry")?;
    }
    Ok(())
}

pub fn store_remove(shelf: &Shelf, args: StoreRemoveArgs) -> anyhow::Result<()> {
    if backup::remove_entry(shelf.catalog().store().as_ref(), &args.key)? {
        println!("removed {}", args.key);
    } else {
        println!("no such key: {}", args.key);
    }
    Ok(())
}

fn describe(key: &StoreKey) -> String {
    match key {
        StoreKey::Sites => "sites".to_owned(),
        StoreKey::Titles => "titles".to_owned(),
        StoreKey::Chapters(link) => format!("chapters of {link}"),
        StoreKey::Images(href) => format!("images of {href}"),
        StoreKey::SelectedChapter => "selected chapter".to_owned(),
        StoreKey::Other(_) => "other".to_owned(),
    }
}
