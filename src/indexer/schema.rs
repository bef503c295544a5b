use serde::{Deserialize, Serialize};

/// Defines a single comic record as served by the remote API and as stored in the index.
///
/// Field names follow the JSON document the API returns, so the same type is
/// used both to decode remote responses and to persist the local index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    /// The comic's number. This is the unique key of the index.
    pub num: u32,
    pub title: String,
    pub safe_title: String,

    // Older comics carry a transcript, most recent ones come back with an empty string.
    #[serde(default)]
    pub transcript: String,

    pub alt: String,
    /// Absolute URL of the comic image.
    pub img: String,

    // Publication date, kept as the strings the API returns ("1", "12", "2024").
    pub day: String,
    pub month: String,
    pub year: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<String>,

    /// Permalink. Usually empty.
    #[serde(default)]
    pub link: String,
}

impl Comic {
    /// The key this comic is stored under in the index.
    pub fn key(&self) -> String {
        self.num.to_string()
    }
}

#[cfg(test)]
pub(crate) fn sample(num: u32, transcript: &str) -> Comic {
    Comic {
        num,
        title: format!("Comic {}", num),
        safe_title: format!("Comic {}", num),
        transcript: transcript.to_string(),
        alt: format!("alt text {}", num),
        img: format!("https://imgs.xkcd.com/comics/comic_{}.png", num),
        day: "1".to_string(),
        month: "4".to_string(),
        year: "2010".to_string(),
        news: None,
        link: String::new(),
    }
}
