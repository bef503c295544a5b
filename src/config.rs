use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

pub const DEFAULT_INDEX_FILE: &str = "comic_index.json";
pub const DEFAULT_BASE_URL: &str = "https://xkcd.com/";

/// Settings shared by every command. Each one can also come from the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Where the comic index is stored
    #[arg(long, global = true, env = "COMIC_SEARCH_INDEX", default_value = DEFAULT_INDEX_FILE)]
    pub index_path: PathBuf,

    /// Root of the comic JSON API
    #[arg(long, global = true, env = "COMIC_SEARCH_BASE_URL", default_value = DEFAULT_BASE_URL, value_parser = parse_base_url)]
    pub base_url: Url,

    /// Maximum number of comics fetched at the same time
    #[arg(long, global = true, env = "COMIC_SEARCH_CONCURRENCY", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Per-request timeout, in seconds
    #[arg(long, global = true, env = "COMIC_SEARCH_TIMEOUT", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parses the API root, making sure it ends with a slash so comic paths join under it.
fn parse_base_url(s: &str) -> Result<Url, String> {
    let mut url = Url::parse(s).map_err(|e| format!("invalid base url '{}': {}", s, e))?;
    if url.cannot_be_a_base() {
        return Err(format!("'{}' cannot be used as a base url", s));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
