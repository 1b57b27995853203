use std::path::PathBuf;

pub const STORE_ENV: &str = "MANHUWA_SHELF_STORE";
pub const API_URL_ENV: &str = "MANHUWA_SHELF_API_URL";

pub const DEFAULT_STORE_PATH: &str = "manhuwa-shelf.json";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfConfig {
    /// JSON document backing the key-value store.
    pub store_path: PathBuf,
    /// Base URL the `/api/*` scrape endpoints are served under.
    pub api_url: String,
}

impl ShelfConfig {
    /// Command-line values win over the environment, which wins over defaults.
    pub fn resolve(store: Option<&str>, api_url: Option<&str>) -> Self {
        Self::resolve_with(store, api_url, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        store: Option<&str>,
        api_url: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let store_path = store
            .map(str::to_owned)
            .or_else(|| non_empty(env(STORE_ENV)))
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_owned());
        let api_url = api_url
            .map(str::to_owned)
            .or_else(|| non_empty(env(API_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        Self {
            store_path: PathBuf::from(store_path),
            api_url,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
