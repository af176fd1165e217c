use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, InputMessage, InputRole, OutputItem, OutputMessageContent,
    },
};
use tracing::debug;

use super::error::ServiceError;

pub async fn request_single_text_response(
    client: &Client<OpenAIConfig>,
    model: &str,
    system_prompt: Option<&str>,
    user_prompt: &str,
    max_output_tokens: u32,
) -> Result<String, ServiceError> {
    let mut input = Vec::with_capacity(2);
    if let Some(system_prompt) = system_prompt {
        input.push(InputMessage {
            role: InputRole::System,
            content: vec![system_prompt.into()],
            status: None,
        });
    }
    input.push(InputMessage {
        role: InputRole::User,
        content: vec![user_prompt.into()],
        status: None,
    });

    let request = CreateResponseArgs::default()
        .model(model)
        .max_output_tokens(max_output_tokens)
        .input(input)
        .build()?;

    debug!(model, "sending language service request");
    let response = client.responses().create(request).await?;

    for item in response.output {
        if let OutputItem::Message(message) = item {
            for content in message.content {
                if let OutputMessageContent::OutputText(text) = content {
                    let trimmed = text.text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Ok(trimmed.to_string());
                }
            }
        }
    }

    Err(ServiceError::EmptyResponse)
}
