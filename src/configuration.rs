use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::Source;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub api_keys: ApiKeySettings,
    #[serde(default)]
    pub intent: IntentSettings,
    #[serde(default)]
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub arena: ArenaSettings,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    #[serde(default)]
    pub relevance: RelevanceSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApiKeySettings {
    pub openai: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct IntentSettings {
    pub model: String,
    pub api_base: Option<String>,
    pub suggestion_count: u8,
    /// Budget for intent parsing and suggestions, capped at a quarter of the
    /// request deadline.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

impl Default for IntentSettings {
    fn default() -> Self {
        IntentSettings {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            suggestion_count: 5,
            timeout_secs: 10,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.trim().is_empty()
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CredentialSettings {
    pub pinterest: Option<Credentials>,
    pub savee: Option<Credentials>,
    pub shotdeck: Option<Credentials>,
}

impl CredentialSettings {
    /// Complete credentials for a platform, if any were configured.
    pub fn for_source(&self, source: Source) -> Option<Credentials> {
        let credentials = match source {
            Source::Pinterest => &self.pinterest,
            Source::Savee => &self.savee,
            Source::Shotdeck => &self.shotdeck,
            Source::Arena => &None,
        };

        credentials.clone().filter(Credentials::is_complete)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub navigation_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub login_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub scroll_cycles: u8,
    pub scroll_delay_ms: u64,
    pub min_image_width: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        BrowserSettings {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            user_agent: None,
            navigation_timeout_secs: 30,
            login_timeout_secs: 30,
            settle_delay_ms: 3000,
            scroll_cycles: 3,
            scroll_delay_ms: 1000,
            min_image_width: 100,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ArenaSettings {
    pub base_url: String,
    pub page_size: u32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        ArenaSettings {
            base_url: "https://api.are.na".to_string(),
            page_size: 100,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AggregationSettings {
    pub default_platforms: Vec<Source>,
    pub per_platform_limit: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub direct_api_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub browser_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        AggregationSettings {
            default_platforms: vec![Source::Pinterest, Source::Arena],
            per_platform_limit: 30,
            direct_api_timeout_secs: 15,
            browser_timeout_secs: 90,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RelevanceSettings {
    pub denylist_terms: Vec<String>,
    pub url_blocklist: Vec<String>,
    pub max_title_length: usize,
    pub min_score: f64,
    pub min_text_length: usize,
    pub weights: ScoringWeights,
}

impl Default for RelevanceSettings {
    fn default() -> Self {
        let denylist_terms = [
            "article",
            "screenshot",
            "infographic",
            "logo",
            "meme",
            "thumbnail",
            "tweet",
            "headline",
            "newsletter",
            "clip art",
        ];
        let url_blocklist = [
            r"(?i)(^|[/.])(twitter|facebook|tiktok|reddit|linkedin)\.com",
            r"(?i)(^|[/.])x\.com/",
            r"(?i)(^|[/.])(medium|substack|wordpress|blogspot|tumblr)\.com",
            r"(?i)\.(gif|svg)(\?|#|\s|$)",
            r"(?i)/(avatars?|profile_images?|profile_pics?)/",
            r"(?i)/(30x30|50x50|60x60|75x75|140x140)(_[a-z]+)?/",
            r"(?i)[_-](thumb|small|icon)\.(jpe?g|png|webp)",
        ];

        RelevanceSettings {
            denylist_terms: denylist_terms.iter().map(|t| t.to_string()).collect(),
            url_blocklist: url_blocklist.iter().map(|p| p.to_string()).collect(),
            max_title_length: 120,
            min_score: 0.15,
            min_text_length: 5,
            weights: ScoringWeights::default(),
        }
    }
}

/// Every constant the relevance scorer uses.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f64,
    pub sparse_text_score: f64,
    pub no_match_score: f64,
    pub no_match_floor: f64,
    pub query_term: f64,
    pub subject_phrase: f64,
    pub subject_word: f64,
    pub mood: f64,
    pub style: f64,
    pub color: f64,
    pub negative_filter_penalty: f64,
    pub irrelevant_term_penalty: f64,
    pub photo_term_bonus: f64,
    pub photo_terms: Vec<String>,
    pub irrelevant_terms: Vec<String>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let photo_terms = [
            "photo",
            "photograph",
            "shot",
            "portrait",
            "candid",
            "capture",
            "film",
            "cinema",
            "cinematic",
        ];
        let irrelevant_terms = [
            "article",
            "blog",
            "news",
            "meme",
            "funny",
            "lol",
            "wtf",
            "omg",
            "click",
            "subscribe",
        ];

        ScoringWeights {
            base: 0.4,
            sparse_text_score: 0.5,
            no_match_score: 0.45,
            no_match_floor: 0.35,
            query_term: 0.15,
            subject_phrase: 0.2,
            subject_word: 0.08,
            mood: 0.1,
            style: 0.1,
            color: 0.05,
            negative_filter_penalty: 0.25,
            irrelevant_term_penalty: 0.15,
            photo_term_bonus: 0.05,
            photo_terms: photo_terms.iter().map(|t| t.to_string()).collect(),
            irrelevant_terms: irrelevant_terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No working directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("aggregation.default_platforms")
                .with_list_parse_key("relevance.denylist_terms"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::{CredentialSettings, Credentials, RelevanceSettings};
    use crate::domain::Source;

    #[test]
    fn incomplete_credentials_are_ignored() {
        let credentials = CredentialSettings {
            pinterest: Some(Credentials::new("me@example.com", "")),
            savee: Some(Credentials::new("me@example.com", "hunter2")),
            shotdeck: None,
        };

        assert!(credentials.for_source(Source::Pinterest).is_none());
        assert!(credentials.for_source(Source::Savee).is_some());
        assert!(credentials.for_source(Source::Shotdeck).is_none());
        assert!(credentials.for_source(Source::Arena).is_none());
    }

    #[test]
    fn default_blocklist_patterns_compile() {
        let settings = RelevanceSettings::default();
        assert!(regex::RegexSet::new(&settings.url_blocklist).is_ok());
    }

    #[test]
    fn relevance_settings_deserialize_partially() {
        let settings: RelevanceSettings =
            serde_json::from_str(r#"{"max_title_length": 80, "weights": {"base": 0.3}}"#).unwrap();

        assert_eq!(settings.max_title_length, 80);
        assert_eq!(settings.weights.base, 0.3);
        assert_eq!(settings.weights.subject_phrase, 0.2);
        assert!(!settings.denylist_terms.is_empty());
    }
}
