use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

use crate::{configuration::IntentSettings, domain::SearchIntent, error::IntentError};

const INTENT_PROMPT: &str = r#"You are a visual search intent parser for a creative discovery platform used by art directors, creative directors, and filmmakers.
These professionals search for reference imagery, mood board material, and visual inspiration for projects.
Interpret queries with this creative industry context in mind.
Parse the user's search query and extract structured information.

Return JSON with these fields:
- refinedQuery: optimized search terms for image platforms (focus on the visual subject)
- mood: emotional qualities (e.g., "romantic", "serene", "energetic")
- colors: dominant colors mentioned or implied
- style: visual styles (e.g., "candid", "cinematic", "editorial")
- subjects: main subjects/objects in the image
- negativeFilters: content types to EXCLUDE

IMPORTANT for negativeFilters - ALWAYS include these unless the user explicitly wants them:
- For photos of people/places: ["illustration", "vector", "clip art", "book cover", "magazine", "poster", "graphic design", "logo", "icon", "screenshot", "article", "text", "infographic", "meme", "tweet", "social media post", "news", "blog", "website", "chart", "diagram", "cartoon", "anime", "comic"]
- For art/design: ["stock photo", "amateur", "low quality"]
- Always aggressively filter out text-heavy content, articles, and social media screenshots
- Default to photo/visual content unless user asks for illustrations or graphics"#;

const SUGGESTIONS_PROMPT: &str = r#"Generate {count} related visual search queries for creative professionals (art directors, creative directors, filmmakers).
Think like someone building a mood board or seeking visual reference for a project.
Return JSON with: { "suggestions": ["query1", "query2", ...] }
Make suggestions progressively more specific and creative."#;

/// The language model behind intent parsing and query suggestions.
#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn parse_intent(&self, query: &str) -> Result<SearchIntent, IntentError>;

    async fn suggestions(&self, query: &str, mood: &[String]) -> Result<Vec<String>, IntentError>;
}

#[derive(Deserialize)]
struct Suggestions {
    #[serde(default)]
    suggestions: Vec<String>,
}

pub struct OpenaiClient {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    suggestion_count: u8,
}

impl OpenaiClient {
    /// Without an API key every call fails with [`IntentError::NotConfigured`]
    /// and no request is made.
    pub fn new(api_key: Option<String>, settings: &IntentSettings) -> Self {
        let client = api_key.filter(|k| !k.trim().is_empty()).map(|api_key| {
            let mut config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(api_base) = &settings.api_base {
                config = config.with_api_base(api_base);
            }
            Client::with_config(config)
        });

        OpenaiClient {
            client,
            model: settings.model.clone(),
            suggestion_count: settings.suggestion_count,
        }
    }

    async fn complete_json(
        &self,
        system: &str,
        user: String,
        temperature: f32,
    ) -> Result<String, IntentError> {
        let client = self.client.as_ref().ok_or(IntentError::NotConfigured)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonObject)
            .temperature(temperature)
            .max_tokens(1000_u32)
            .build()?;

        let response = client.chat().create(request).await?;
        log::debug!("Language model usage: {:?}", response.usage);

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(IntentError::EmptyResponse)
    }
}

#[async_trait]
impl IntentSource for OpenaiClient {
    async fn parse_intent(&self, query: &str) -> Result<SearchIntent, IntentError> {
        let content = self
            .complete_json(INTENT_PROMPT, format!("User query: \"{}\"", query), 0.7)
            .await?;
        let intent: SearchIntent = serde_json::from_str(&content)?;

        Ok(intent.tidy())
    }

    async fn suggestions(&self, query: &str, mood: &[String]) -> Result<Vec<String>, IntentError> {
        let system = SUGGESTIONS_PROMPT.replace("{count}", &self.suggestion_count.to_string());
        let mut user = format!("Original: \"{}\"", query);
        if !mood.is_empty() {
            user.push_str(&format!("\nMood: {}", mood.join(", ")));
        }

        let content = self.complete_json(&system, user, 0.9).await?;
        let parsed: Suggestions = serde_json::from_str(&content)?;

        Ok(parsed
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(self.suggestion_count as usize)
            .collect())
    }
}
