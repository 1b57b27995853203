//! Typed collections over a [`KeyValueStore`].
//!
//! Reads never fail: an absent key, an unavailable store, or a payload that
//! does not parse all read as the empty value. Writes are best effort and
//! report success as a `bool`; failures are logged.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::formats::{Chapter, Site, Title};
use crate::keys::StoreKey;
use crate::kv::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddTitle {
    Added,
    AlreadyBookmarked,
    /// Accepted, but persisting the collection failed.
    NotSaved,
}

/// Outcome of removing everything scoped to one title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Chapter hrefs whose image cache entry was removed.
    pub removed_images: Vec<String>,
    /// Chapter hrefs whose image cache entry could not be removed.
    pub failed_images: Vec<String>,
    /// Whether the chapter list entry itself was removed. It is kept when any
    /// image removal failed, so a retry can still reach the leftover entries.
    pub chapters_removed: bool,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failed_images.is_empty() && self.chapters_removed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedTitle {
    /// The remaining titles, as persisted.
    pub titles: Vec<Title>,
    pub cascade: CascadeReport,
}

// Only the href is needed to cascade; tolerate chapter records missing `text`.
#[derive(serde::Deserialize)]
struct ChapterHref {
    href: String,
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn KeyValueStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // --- sites ---

    pub fn load_sites(&self) -> Vec<Site> {
        self.read_list(&StoreKey::Sites)
    }

    /// Full replace. Uniqueness is not checked here.
    pub fn save_sites(&self, sites: &[Site]) -> bool {
        self.write(&StoreKey::Sites, sites)
    }

    pub fn remove_site(&self, sites: &[Site], id: u64) -> Vec<Site> {
        let updated: Vec<Site> = sites.iter().filter(|s| s.id != id).cloned().collect();
        self.save_sites(&updated);
        updated
    }

    /// One past the largest id in `sites`, or 0 when there are none.
    pub fn next_site_id(sites: &[Site]) -> u64 {
        sites.iter().map(|s| s.id).max().map_or(0, |max| max + 1)
    }

    // --- titles ---

    pub fn load_titles(&self) -> Vec<Title> {
        self.read_list(&StoreKey::Titles)
    }

    pub fn save_titles(&self, titles: &[Title]) -> bool {
        self.write(&StoreKey::Titles, titles)
    }

    pub fn find_title(&self, link: &str) -> Option<Title> {
        self.load_titles().into_iter().find(|t| t.link == link)
    }

    /// Appends `title` unless a title with the same link is bookmarked.
    pub fn add_title(&self, title: Title) -> AddTitle {
        let mut titles = self.load_titles();
        if titles.iter().any(|t| t.link == title.link) {
            return AddTitle::AlreadyBookmarked;
        }
        titles.push(title);
        if self.save_titles(&titles) {
            AddTitle::Added
        } else {
            AddTitle::NotSaved
        }
    }

    /// Drops the title with `link`, persists the rest and removes the
    /// title's chapters and image caches.
    pub fn remove_title(&self, titles: &[Title], link: &str) -> RemovedTitle {
        let updated: Vec<Title> = titles.iter().filter(|t| t.link != link).cloned().collect();
        self.save_titles(&updated);
        let cascade = self.remove_related_data(link);
        if !cascade.is_complete() {
            tracing::warn!(link, ?cascade, "title removed with leftover data");
        }
        RemovedTitle {
            titles: updated,
            cascade,
        }
    }

    /// Removes the image cache of every chapter of the title, then its chapter
    /// list. Not transactional: every image entry is attempted, and the
    /// chapter list is only removed when all of them went away.
    pub fn remove_related_data(&self, title_link: &str) -> CascadeReport {
        let chapters_key = StoreKey::chapters(title_link);
        let chapters: Vec<ChapterHref> = self.read(&chapters_key).unwrap_or_default();

        let mut report = CascadeReport::default();
        for chapter in chapters {
            if self.delete(&StoreKey::images(&chapter.href)) {
                report.removed_images.push(chapter.href);
            } else {
                report.failed_images.push(chapter.href);
            }
        }

        if report.failed_images.is_empty() {
            report.chapters_removed = self.delete(&chapters_key);
        } else {
            tracing::warn!(
                title_link,
                failed = report.failed_images.len(),
                "keeping chapter list; some image caches could not be removed"
            );
        }

        tracing::debug!(
            title_link,
            removed_images = report.removed_images.len(),
            chapters_removed = report.chapters_removed,
            "removed related data"
        );
        report
    }

    // --- chapters ---

    pub fn load_chapters(&self, title_link: &str) -> Vec<Chapter> {
        self.read_list(&StoreKey::chapters(title_link))
    }

    pub fn set_chapters(&self, title_link: &str, chapters: &[Chapter]) -> bool {
        self.write(&StoreKey::chapters(title_link), chapters)
    }

    /// Appends `chapter` unless one with the same href exists. Returns whether
    /// it was appended and saved. Read-modify-write; not atomic.
    pub fn add_chapter(&self, title_link: &str, chapter: Chapter) -> bool {
        let mut chapters = self.load_chapters(title_link);
        if chapters.iter().any(|c| c.href == chapter.href) {
            return false;
        }
        chapters.push(chapter);
        self.set_chapters(title_link, &chapters)
    }

    /// Removes one chapter and its image cache. Siblings are untouched.
    pub fn remove_chapter(&self, title_link: &str, chapter_href: &str) -> bool {
        let chapters: Vec<Chapter> = self
            .load_chapters(title_link)
            .into_iter()
            .filter(|c| c.href != chapter_href)
            .collect();
        let saved = self.set_chapters(title_link, &chapters);
        let images_removed = self.delete(&StoreKey::images(chapter_href));
        saved && images_removed
    }

    // --- selected chapter ---

    pub fn set_selected_chapter(&self, chapter: &Chapter) -> bool {
        self.write(&StoreKey::SelectedChapter, chapter)
    }

    pub fn load_selected_chapter(&self) -> Option<Chapter> {
        self.read(&StoreKey::SelectedChapter)
    }

    // --- images ---

    pub fn load_images(&self, chapter_href: &str) -> Vec<String> {
        self.read_list(&StoreKey::images(chapter_href))
    }

    pub fn set_images(&self, chapter_href: &str, images: &[String]) -> bool {
        self.write(&StoreKey::images(chapter_href), images)
    }

    pub fn add_image(&self, chapter_href: &str, image_url: &str) -> bool {
        let mut images = self.load_images(chapter_href);
        if images.iter().any(|i| i == image_url) {
            return false;
        }
        images.push(image_url.to_owned());
        self.set_images(chapter_href, &images)
    }

    pub fn remove_image(&self, chapter_href: &str, image_url: &str) -> bool {
        let mut images = self.load_images(chapter_href);
        let before = images.len();
        images.retain(|i| i != image_url);
        if images.len() == before {
            return false;
        }
        self.set_images(chapter_href, &images)
    }

    // --- raw access ---

    fn read<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<T> {
        let raw = match self.store.get(&key.encode()) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                tracing::debug!(%key, ?err, "store unavailable; reading as empty");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%key, %err, "failed to parse stored value");
                None
            }
        }
    }

    fn read_list<T: DeserializeOwned>(&self, key: &StoreKey) -> Vec<T> {
        self.read(key).unwrap_or_default()
    }

    fn write<T: Serialize + ?Sized>(&self, key: &StoreKey, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%key, %err, "failed to serialize value");
                return false;
            }
        };
        match self.store.set(&key.encode(), &raw) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%key, ?err, "failed to persist value");
                false
            }
        }
    }

    fn delete(&self, key: &StoreKey) -> bool {
        match self.store.remove(&key.encode()) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%key, ?err, "failed to remove value");
                false
            }
        }
    }
}
