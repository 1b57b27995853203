use std::sync::LazyLock;

use regex::Regex;

use crate::formats::Chapter;

static CHAPTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.]+").expect("valid chapter number regex"));

/// Step through a title's chapters in reading order.
///
/// Chapter lists keep the order the source site publishes them in, which is
/// newest first. Going to the previous chapter therefore moves towards the
/// end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    Previous,
    Next,
}

/// Label comparison key: whitespace removed, lowercased.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of `selected` in `chapters`: by href, then by normalised label.
pub fn position_of(chapters: &[Chapter], selected: &Chapter) -> Option<usize> {
    if let Some(index) = chapters.iter().position(|c| c.href == selected.href) {
        return Some(index);
    }
    let wanted = normalize_label(&selected.text);
    chapters
        .iter()
        .position(|c| normalize_label(&c.text) == wanted)
}

pub fn neighbour(chapters: &[Chapter], index: usize, direction: Direction) -> Option<&Chapter> {
    let target = match direction {
        Direction::Previous => index.checked_add(1)?,
        Direction::Next => index.checked_sub(1)?,
    };
    chapters.get(target)
}

/// First run of digits and dots in `text`, e.g. `"Chapter 12.5"` -> `"12.5"`.
pub fn chapter_number(text: &str) -> &str {
    CHAPTER_NUMBER.find(text).map_or("", |m| m.as_str())
}

pub fn chapter_slug(text: &str) -> String {
    format!("chapter-{}", chapter_number(text))
}
