use serde::Deserialize;

/// Platform-shaped output of a source adapter, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Arena(ArenaBlock),
    Scraped(ScrapedImage),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArenaSearchResponse {
    #[serde(default)]
    pub blocks: Vec<ArenaBlock>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArenaBlock {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<ArenaImage>,
    pub source: Option<ArenaLink>,
    pub user: Option<ArenaUser>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArenaImage {
    pub display: Option<ArenaLink>,
    pub thumb: Option<ArenaLink>,
    pub original: Option<ArenaLink>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArenaLink {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArenaUser {
    pub slug: Option<String>,
    pub full_name: Option<String>,
}

impl ArenaBlock {
    pub fn image_url(&self) -> Option<&str> {
        let image = self.image.as_ref()?;
        link_url(&image.display).or_else(|| link_url(&image.original))
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        let image = self.image.as_ref()?;
        link_url(&image.thumb).or_else(|| link_url(&image.display))
    }
}

fn link_url(link: &Option<ArenaLink>) -> Option<&str> {
    link.as_ref()
        .and_then(|l| l.url.as_deref())
        .filter(|u| !u.is_empty())
}

/// One `<img>` pulled out of a rendered search page.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedImage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_url: String,
}
