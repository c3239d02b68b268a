use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::store::SupabaseStore;

const SYSTEM_PROMPT: &str = "You are Helpy, a support assistant for a delivery service. \
     Answer customer questions briefly and politely. \
     If a customer asks about an order, ask them for their tracking number.";

/// Concatenates every digit in `input` into an opaque tracking key.
/// Returns `None` when the message carries no digit at all, which routes the
/// message to the language model instead.
pub fn extract_tracking_digits(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Wrapper around the completion service. Holds the client and model name;
/// the fixed system prompt lives here too.
#[derive(Clone)]
pub struct SupportAssistant {
    client: Client<OpenAIConfig>,
    model: String,
}

impl SupportAssistant {
    pub fn new(config: &Config) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(key) = &config.openai_api_key {
            openai_config = openai_config.with_api_key(key);
        }
        if let Some(base) = &config.openai_api_base {
            openai_config = openai_config.with_api_base(base);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.openai_model.clone(),
        }
    }

    /// Sends the customer message to the completion service and relays the
    /// first completion verbatim.
    pub async fn reply(&self, input: &str) -> AppResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(input)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::OpenAIError(OpenAIError::InvalidArgument(
                    "completion had no content".to_string(),
                ))
            })
    }
}

/// Handles one free-text customer message.
///
/// Messages containing digits are treated as order-status lookups: the
/// digits are concatenated into a tracking key and checked against the
/// store. A miss gets an explicit reply rather than falling through to the
/// model, so the customer knows the lookup ran and failed. Messages without
/// digits go to the completion service.
pub async fn handle_chat_message(
    store: &SupabaseStore,
    assistant: &SupportAssistant,
    input: &str,
) -> AppResult<String> {
    if let Some(tracking_id) = extract_tracking_digits(input) {
        return match store
            .select_single("orders", &[("tracking_id", &tracking_id)])
            .await?
        {
            Some(order) => {
                let status = order["status"].as_str().unwrap_or("being processed");
                Ok(format!("Your order {} is currently: {}", tracking_id, status))
            }
            None => Ok(format!(
                "I couldn't find an order with tracking number {}. \
                 Please check the number, or rephrase your question without it.",
                tracking_id
            )),
        };
    }

    assistant.reply(input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_concatenated_across_the_message() {
        assert_eq!(
            extract_tracking_digits("where is order 12 34-5?"),
            Some("12345".to_string())
        );
    }

    #[test]
    fn message_without_digits_goes_to_the_model() {
        assert_eq!(extract_tracking_digits("where is my stuff?"), None);
    }

    #[test]
    fn digits_only_message_is_a_lookup() {
        assert_eq!(
            extract_tracking_digits("775f9a3c"),
            Some("77593".to_string())
        );
    }
}
