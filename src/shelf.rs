use std::sync::Arc;

use anyhow::Context as _;
use url::Url;

use crate::api::ScrapeApi;
use crate::catalog::{AddTitle, Catalog, RemovedTitle};
use crate::formats::{Chapter, SearchHit, Site, Title};
use crate::reader::{self, Direction};

/// Search results of one registered site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResults {
    pub site_title: String,
    pub favicon_url: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleView {
    pub title: Title,
    pub chapters: Vec<Chapter>,
    /// True when the chapter list came from the scrape api rather than the cache.
    pub fetched: bool,
    pub fetch_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterView {
    pub title: Title,
    pub chapter: Chapter,
    /// Position of `chapter` in the title's chapter list.
    pub index: usize,
    pub chapter_count: usize,
    pub images: Vec<String>,
    pub from_cache: bool,
    /// No images could be obtained; the source likely requires a login.
    pub needs_login: bool,
    pub fetch_error: Option<String>,
}

impl ChapterView {
    pub fn slug(&self) -> String {
        reader::chapter_slug(&self.chapter.text)
    }

    pub fn has_previous(&self) -> bool {
        self.index + 1 < self.chapter_count
    }

    pub fn has_next(&self) -> bool {
        self.index > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSelector {
    Href(String),
    Text(String),
}

/// The application workflows: registering sites, searching, bookmarking and
/// reading, with results cached in the catalog.
#[derive(Clone)]
pub struct Shelf {
    catalog: Catalog,
    api: Arc<dyn ScrapeApi>,
}

impl Shelf {
    pub fn new(catalog: Catalog, api: Arc<dyn ScrapeApi>) -> Self {
        Self { catalog, api }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn register_site(&self, url: &str) -> anyhow::Result<Site> {
        Url::parse(url).with_context(|| format!("invalid site url: {url}"))?;

        let info = self
            .api
            .favicon_title(url)
            .await
            .context("fetch site data")?;

        let mut sites = self.catalog.load_sites();
        if sites.iter().any(|s| s.url == url) {
            tracing::warn!(url, "site url is already registered; adding it again");
        }
        let site = Site {
            id: Catalog::next_site_id(&sites),
            url: url.to_owned(),
            favicon_url: info.favicon_url,
            site_title: info.site_title,
        };
        sites.push(site.clone());
        if !self.catalog.save_sites(&sites) {
            anyhow::bail!("failed to save sites");
        }

        tracing::info!(id = site.id, url, title = %site.site_title, "registered site");
        Ok(site)
    }

    /// Returns whether a site with `id` existed.
    pub fn remove_site(&self, id: u64) -> bool {
        let sites = self.catalog.load_sites();
        let updated = self.catalog.remove_site(&sites, id);
        updated.len() != sites.len()
    }

    /// Searches every registered site concurrently. A site whose request
    /// fails contributes no hits.
    pub async fn search(&self, target_name: &str) -> anyhow::Result<Vec<SiteResults>> {
        let target_name = target_name.trim();
        if target_name.is_empty() {
            anyhow::bail!("search target name must not be empty");
        }

        let sites = self.catalog.load_sites();
        if sites.is_empty() {
            anyhow::bail!("no saved sites to search");
        }
        let sites: Vec<Site> = sites
            .into_iter()
            .filter(|s| !s.url.trim().is_empty())
            .collect();
        if sites.is_empty() {
            anyhow::bail!("no saved sites with valid urls to search");
        }

        let handles: Vec<_> = sites
            .iter()
            .map(|site| {
                let api = Arc::clone(&self.api);
                let url = site.url.clone();
                let target_name = target_name.to_owned();
                tokio::spawn(async move { api.search_links(&url, &target_name).await })
            })
            .collect();

        let mut results = Vec::with_capacity(sites.len());
        for (site, handle) in sites.into_iter().zip(handles) {
            let hits = match handle.await {
                Ok(Ok(hits)) => hits,
                Ok(Err(err)) => {
                    tracing::warn!(url = %site.url, ?err, "search failed");
                    Vec::new()
                }
                Err(err) => {
                    tracing::warn!(url = %site.url, ?err, "search task failed");
                    Vec::new()
                }
            };
            results.push(SiteResults {
                site_title: site.site_title,
                favicon_url: site.favicon_url,
                hits,
            });
        }

        let total: usize = results.iter().map(|r| r.hits.len()).sum();
        tracing::info!(target_name, sites = results.len(), total, "search finished");
        Ok(results)
    }

    pub fn bookmark(&self, title: Title) -> AddTitle {
        let link = title.link.clone();
        let outcome = self.catalog.add_title(title);
        tracing::info!(link, ?outcome, "bookmark");
        outcome
    }

    /// Bookmarks the search hit with `link`, taking the first site that
    /// returned it as the title's source site.
    pub fn bookmark_hit(
        &self,
        results: &[SiteResults],
        link: &str,
    ) -> anyhow::Result<(Title, AddTitle)> {
        let title = results
            .iter()
            .find_map(|site| {
                site.hits
                    .iter()
                    .find(|hit| hit.link == link)
                    .map(|hit| hit.clone().into_title(site.site_title.clone()))
            })
            .ok_or_else(|| anyhow::anyhow!("no search result with link {link}"))?;
        let outcome = self.bookmark(title.clone());
        Ok((title, outcome))
    }

    /// Removes a bookmarked title together with its chapters and images.
    pub fn unbookmark(&self, link: &str) -> anyhow::Result<RemovedTitle> {
        let titles = self.catalog.load_titles();
        if !titles.iter().any(|t| t.link == link) {
            anyhow::bail!("title is not bookmarked: {link}");
        }
        Ok(self.catalog.remove_title(&titles, link))
    }

    /// Chapter list of a bookmarked title: the cached list when there is one,
    /// otherwise fetched.
    pub async fn open_title(&self, link: &str) -> anyhow::Result<TitleView> {
        let title = self.bookmarked(link)?;
        let cached = self.catalog.load_chapters(link);
        if !cached.is_empty() {
            return Ok(TitleView {
                title,
                chapters: cached,
                fetched: false,
                fetch_error: None,
            });
        }
        Ok(self.fetch_chapters(title).await)
    }

    pub async fn refresh_chapters(&self, link: &str) -> anyhow::Result<TitleView> {
        let title = self.bookmarked(link)?;
        Ok(self.fetch_chapters(title).await)
    }

    // The cache only grows when the fetched count differs from the cached
    // count; new chapters are appended by href.
    async fn fetch_chapters(&self, title: Title) -> TitleView {
        let cached = self.catalog.load_chapters(&title.link);
        match self.api.chapter_links(&title.link, &title.name).await {
            Ok(fetched) => {
                if fetched.len() != cached.len() {
                    let mut added = 0;
                    for chapter in &fetched {
                        if self.catalog.add_chapter(&title.link, chapter.clone()) {
                            added += 1;
                        }
                    }
                    tracing::info!(
                        link = %title.link,
                        cached = cached.len(),
                        fetched = fetched.len(),
                        added,
                        "updated chapter cache"
                    );
                }
                TitleView {
                    title,
                    chapters: fetched,
                    fetched: true,
                    fetch_error: None,
                }
            }
            Err(err) => {
                tracing::warn!(link = %title.link, ?err, "failed to load chapters");
                TitleView {
                    title,
                    chapters: Vec::new(),
                    fetched: true,
                    fetch_error: Some(format!("{err:#}")),
                }
            }
        }
    }

    pub fn select_chapter(&self, link: &str, selector: &ChapterSelector) -> anyhow::Result<Chapter> {
        self.bookmarked(link)?;
        let chapters = self.catalog.load_chapters(link);
        let chapter = match selector {
            ChapterSelector::Href(href) => chapters.into_iter().find(|c| &c.href == href),
            ChapterSelector::Text(text) => {
                let wanted = reader::normalize_label(text);
                chapters
                    .into_iter()
                    .find(|c| reader::normalize_label(&c.text) == wanted)
            }
        }
        .ok_or_else(|| anyhow::anyhow!("chapter not found in {link}: {selector:?}"))?;

        if !self.catalog.set_selected_chapter(&chapter) {
            anyhow::bail!("failed to save selected chapter");
        }
        Ok(chapter)
    }

    /// Drops one chapter of a bookmarked title and its image cache.
    pub fn remove_chapter(&self, link: &str, href: &str) -> anyhow::Result<()> {
        self.bookmarked(link)?;
        if !self.catalog.load_chapters(link).iter().any(|c| c.href == href) {
            anyhow::bail!("chapter not found in {link}: {href}");
        }
        if !self.catalog.remove_chapter(link, href) {
            anyhow::bail!("failed to remove chapter {href}");
        }
        Ok(())
    }

    /// The selected chapter with its images, from the cache or fetched.
    pub async fn open_chapter(&self, link: &str) -> anyhow::Result<ChapterView> {
        self.chapter_view(link, false).await
    }

    /// Like [`Shelf::open_chapter`] but always fetches and replaces the cache.
    pub async fn refetch_images(&self, link: &str) -> anyhow::Result<ChapterView> {
        self.chapter_view(link, true).await
    }

    /// Moves the selection one chapter in reading order. `None` at either end.
    pub fn navigate(&self, link: &str, direction: Direction) -> anyhow::Result<Option<Chapter>> {
        self.bookmarked(link)?;
        let (_, chapters, index) = self.selection_in(link)?;
        let Some(target) = reader::neighbour(&chapters, index, direction).cloned() else {
            return Ok(None);
        };
        if !self.catalog.set_selected_chapter(&target) {
            anyhow::bail!("failed to save selected chapter");
        }
        Ok(Some(target))
    }

    async fn chapter_view(&self, link: &str, refetch: bool) -> anyhow::Result<ChapterView> {
        let title = self.bookmarked(link)?;
        let (chapter, chapters, index) = self.selection_in(link)?;

        let cached = if refetch {
            Vec::new()
        } else {
            self.catalog.load_images(&chapter.href)
        };

        let (images, from_cache, fetch_error) = if !cached.is_empty() {
            (cached, true, None)
        } else {
            match self.fetch_images(&chapter.href).await {
                Ok(images) => (images, false, None),
                Err(err) => {
                    tracing::warn!(href = %chapter.href, ?err, "failed to fetch images");
                    (Vec::new(), false, Some(format!("{err:#}")))
                }
            }
        };

        Ok(ChapterView {
            needs_login: images.is_empty(),
            title,
            chapter,
            index,
            chapter_count: chapters.len(),
            images,
            from_cache,
            fetch_error,
        })
    }

    async fn fetch_images(&self, href: &str) -> anyhow::Result<Vec<String>> {
        let images = self.api.images(href).await?;
        if !self.catalog.set_images(href, &images) {
            tracing::warn!(href, "images fetched but not cached");
        }
        Ok(images)
    }

    // The selection slot is shared by every title; it only counts for `link`
    // when the selected href is one of the title's chapters.
    fn selection_in(&self, link: &str) -> anyhow::Result<(Chapter, Vec<Chapter>, usize)> {
        let selected = self
            .catalog
            .load_selected_chapter()
            .ok_or_else(|| anyhow::anyhow!("no chapter selected"))?;
        let chapters = self.catalog.load_chapters(link);
        let Some(index) = reader::position_of(&chapters, &selected)
            .filter(|&i| chapters[i].href == selected.href)
        else {
            anyhow::bail!("selected chapter does not belong to {link}");
        };
        Ok((selected, chapters, index))
    }

    fn bookmarked(&self, link: &str) -> anyhow::Result<Title> {
        self.catalog
            .find_title(link)
            .ok_or_else(|| anyhow::anyhow!("title is not bookmarked: {link}"))
    }
}
