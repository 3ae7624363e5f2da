/// Connection settings for an OpenAI-compatible chat-completions
/// endpoint. The reference deployment points this at a Mistral gateway;
/// anything serving `/v1/chat/completions` works. Built once at startup
/// and read-only afterwards.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            temperature: Some(0.0),
            max_tokens: None,
        }
    }
}
