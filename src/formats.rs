use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: u64,
    pub url: String,
    pub favicon_url: String,
    pub site_title: String,
}

/// A bookmarked series. `link` is the canonical source URL and identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub link: String,
    pub name: String,
    pub src: String,
    pub source_site: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub href: String,
    pub text: String,
}

/// One search result as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub link: String,
    pub name: String,
    pub src: String,
}

impl SearchHit {
    pub fn into_title(self, source_site: impl Into<String>) -> Title {
        Title {
            link: self.link,
            name: self.name,
            src: self.src,
            source_site: source_site.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub favicon_url: String,
    pub site_title: String,
}
