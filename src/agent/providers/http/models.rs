//! Request and response bodies for the chat-completions API.

#[derive(serde::Serialize)]
pub struct ChatCompletionMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(serde::Serialize)]
pub struct ChatCompletionPayload<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatCompletionMessage<'a>>,
}

#[derive(serde::Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(serde::Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionReply,
}

#[derive(serde::Deserialize)]
pub struct ChatCompletionReply {
    /// Null when the model answered with tool calls only.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, trimmed. `None` when absent or blank.
    pub fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
