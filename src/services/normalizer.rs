use url::Url;

use crate::domain::{ArenaBlock, ImageCandidate, RawRecord, ScrapedImage, Source};

/// Maps one adapter's raw records to candidates. Ids are
/// `{source}-{run_stamp}-{index}`; records without a usable http(s) image URL
/// are dropped. Stored URLs are the parsed, serialized form.
pub fn normalize(source: Source, records: Vec<RawRecord>, run_stamp: &str) -> Vec<ImageCandidate> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let id = format!("{}-{}-{}", source, run_stamp, index);
            match record {
                RawRecord::Arena(block) => from_arena(id, block),
                RawRecord::Scraped(image) => from_scraped(id, source, image),
            }
        })
        .collect()
}

pub fn parse_http_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

pub fn is_http_url(candidate: &str) -> bool {
    parse_http_url(candidate).is_some()
}

fn from_arena(id: String, block: ArenaBlock) -> Option<ImageCandidate> {
    let url = parse_http_url(block.image_url()?)?;
    let thumbnail_url = match block.thumbnail_url() {
        Some(thumb) => parse_http_url(thumb)?,
        None => url.clone(),
    };

    let source_url = block
        .source
        .as_ref()
        .and_then(|s| s.url.as_deref())
        .and_then(parse_http_url)
        .map(String::from)
        .unwrap_or_else(|| format!("https://www.are.na/block/{}", block.id));
    let (author, author_url) = match block.user {
        Some(user) => (
            user.full_name.filter(|n| !n.is_empty()),
            user.slug
                .filter(|s| !s.is_empty())
                .map(|slug| format!("https://www.are.na/{}", slug)),
        ),
        None => (None, None),
    };

    Some(ImageCandidate {
        id,
        url: url.into(),
        thumbnail_url: thumbnail_url.into(),
        title: block.title.unwrap_or_default(),
        description: block.description.filter(|d| !d.is_empty()),
        source: Source::Arena,
        source_url,
        author,
        author_url,
        relevance: None,
    })
}

fn from_scraped(id: String, source: Source, image: ScrapedImage) -> Option<ImageCandidate> {
    let url = String::from(parse_http_url(&image.url)?);
    // Without a usable page link, the image itself is the best attribution.
    let source_url = parse_http_url(&image.source_url)
        .map(String::from)
        .unwrap_or_else(|| url.clone());

    Some(ImageCandidate {
        id,
        thumbnail_url: url.clone(),
        url,
        title: image.title.trim().to_string(),
        description: None,
        source,
        source_url,
        author: None,
        author_url: None,
        relevance: None,
    })
}

#[cfg(test)]
mod tests {
    use super::{is_http_url, normalize};
    use crate::domain::{
        ArenaBlock, ArenaImage, ArenaLink, ArenaUser, RawRecord, ScrapedImage, Source,
    };

    fn link(url: &str) -> Option<ArenaLink> {
        Some(ArenaLink {
            url: Some(url.to_string()),
        })
    }

    fn scraped(url: &str) -> RawRecord {
        scraped_from(url, "https://savee.it/i/1")
    }

    fn scraped_from(url: &str, source_url: &str) -> RawRecord {
        RawRecord::Scraped(ScrapedImage {
            url: url.to_string(),
            title: " alt text ".to_string(),
            source_url: source_url.to_string(),
        })
    }

    #[test]
    fn http_url_validation() {
        assert!(is_http_url("https://i.pinimg.com/736x/a.jpg"));
        assert!(is_http_url("http://example.com/a.png"));
        assert!(!is_http_url(""));
        assert!(!is_http_url("data:image/png;base64,AAAA"));
        assert!(!is_http_url("/relative/a.jpg"));
        assert!(!is_http_url("ftp://example.com/a.jpg"));
    }

    #[test]
    fn maps_arena_fields() {
        let block = ArenaBlock {
            id: 42,
            title: Some("fog".to_string()),
            description: Some(String::new()),
            image: Some(ArenaImage {
                display: link("https://cdn.are.na/42/display.jpg"),
                thumb: link("https://cdn.are.na/42/thumb.jpg"),
                original: None,
            }),
            source: None,
            user: Some(ArenaUser {
                slug: Some("jane-doe".to_string()),
                full_name: Some("Jane Doe".to_string()),
            }),
        };

        let candidates = normalize(Source::Arena, vec![RawRecord::Arena(block)], "1700000000000");

        let c = &candidates[0];
        assert_eq!(c.id, "arena-1700000000000-0");
        assert_eq!(c.url, "https://cdn.are.na/42/display.jpg");
        assert_eq!(c.thumbnail_url, "https://cdn.are.na/42/thumb.jpg");
        assert_eq!(c.source_url, "https://www.are.na/block/42");
        assert_eq!(c.description, None);
        assert_eq!(c.author.as_deref(), Some("Jane Doe"));
        assert_eq!(c.author_url.as_deref(), Some("https://www.are.na/jane-doe"));
        assert_eq!(c.relevance, None);
    }

    #[test]
    fn drops_invalid_urls_but_keeps_index_based_ids_unique() {
        let records = vec![
            scraped("https://dr.savee-cdn.com/1.jpg"),
            scraped("javascript:void(0)"),
            scraped(""),
            scraped("https://dr.savee-cdn.com/2.jpg"),
            scraped(" https://dr.savee-cdn.com/5.jpg\n"),
        ];

        let candidates = normalize(Source::Savee, records, "7");

        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["savee-7-0", "savee-7-3", "savee-7-4"]);
        assert!(candidates.iter().all(|c| c.thumbnail_url == c.url));
        assert_eq!(candidates[0].title, "alt text");
        assert_eq!(candidates[2].url, "https://dr.savee-cdn.com/5.jpg");
    }

    #[test]
    fn unusable_source_links_fall_back() {
        let records = vec![
            scraped_from("https://dr.savee-cdn.com/1.jpg", ""),
            scraped_from("https://dr.savee-cdn.com/2.jpg", "javascript:void(0)"),
            scraped_from("https://dr.savee-cdn.com/3.jpg", " https://savee.it/i/3 "),
        ];

        let candidates = normalize(Source::Savee, records, "7");

        assert_eq!(candidates[0].source_url, "https://dr.savee-cdn.com/1.jpg");
        assert_eq!(candidates[1].source_url, "https://dr.savee-cdn.com/2.jpg");
        assert_eq!(candidates[2].source_url, "https://savee.it/i/3");

        let block = ArenaBlock {
            id: 9,
            title: None,
            description: None,
            image: Some(ArenaImage {
                display: link("https://cdn.are.na/9/display.jpg"),
                thumb: None,
                original: None,
            }),
            source: link("not a url"),
            user: None,
        };
        let arena = normalize(Source::Arena, vec![RawRecord::Arena(block)], "7");
        assert_eq!(arena[0].source_url, "https://www.are.na/block/9");
        assert_eq!(arena[0].thumbnail_url, arena[0].url);
    }

    #[test]
    fn normalize_is_repeatable() {
        let records = vec![scraped("https://dr.savee-cdn.com/1.jpg")];

        assert_eq!(
            normalize(Source::Savee, records.clone(), "7"),
            normalize(Source::Savee, records, "7")
        );
    }
}
