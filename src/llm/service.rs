use std::future::Future;

use async_openai::{Client, config::OpenAIConfig};
use tokio::time;
use tracing::{debug, warn};

use super::config::ServiceConfig;
use super::error::ServiceError;
use super::prompts::{
    EXPLAIN_SYSTEM_PROMPT, TUTOR_SYSTEM_PROMPT, clean_sentence, correct_list_prompt,
    correct_prompt, correct_variant_prompt, explain_prompt, incorrect_variant_prompt,
    judge_prompt, list_incorrect_prompt, parse_yes_no, split_pipe_list,
};
use super::response::request_single_text_response;

/// The grammar oracle behind reviews and practice sessions.
///
/// No operation is idempotent: asking twice about the same sentence may
/// produce a different surface form.
pub trait LanguageService {
    fn judge_correctness(
        &self,
        sentence: &str,
    ) -> impl Future<Output = Result<bool, ServiceError>> + Send;

    fn correct(&self, sentence: &str) -> impl Future<Output = Result<String, ServiceError>> + Send;

    fn explain_difference(
        &self,
        original: &str,
        corrected: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    fn generate_incorrect_variant(
        &self,
        seed: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    fn generate_correct_variant(
        &self,
        seed: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Lists the ungrammatical sentences of a writing sample, in order.
    fn list_incorrect_sentences(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    /// Corrects each sentence, returning them in the same order.
    fn correct_sentences(
        &self,
        sentences: &[String],
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;
}

#[derive(Clone)]
pub struct OpenAiService {
    client: Client<OpenAIConfig>,
    config: ServiceConfig,
}

impl OpenAiService {
    pub fn new(client: Client<OpenAIConfig>, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    async fn ask(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<String, ServiceError> {
        let request = request_single_text_response(
            &self.client,
            model,
            system_prompt,
            user_prompt,
            self.config.max_output_tokens,
        );
        let outcome = time::timeout(self.config.request_timeout, request).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    model,
                    timeout = ?self.config.request_timeout,
                    "language service request timed out"
                );
                Err(ServiceError::Timeout)
            }
        }
    }

    async fn ask_check(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        self.ask(&self.config.check_model, system_prompt, prompt)
            .await
    }

    async fn ask_generate(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        self.ask(&self.config.generation_model, system_prompt, prompt)
            .await
    }
}

impl LanguageService for OpenAiService {
    async fn judge_correctness(&self, sentence: &str) -> Result<bool, ServiceError> {
        let answer = self
            .ask_check(Some(TUTOR_SYSTEM_PROMPT), &judge_prompt(sentence))
            .await?;
        let grammatical = parse_yes_no(&answer);
        debug!(grammatical, "judged sentence");
        Ok(grammatical)
    }

    async fn correct(&self, sentence: &str) -> Result<String, ServiceError> {
        let corrected = self.ask_check(None, &correct_prompt(sentence)).await?;
        Ok(clean_sentence(&corrected))
    }

    async fn explain_difference(
        &self,
        original: &str,
        corrected: &str,
    ) -> Result<String, ServiceError> {
        self.ask_check(
            Some(EXPLAIN_SYSTEM_PROMPT),
            &explain_prompt(original, corrected),
        )
        .await
    }

    async fn generate_incorrect_variant(&self, seed: &str) -> Result<String, ServiceError> {
        let sentence = self
            .ask_generate(None, &incorrect_variant_prompt(seed))
            .await?;
        Ok(clean_sentence(&sentence))
    }

    async fn generate_correct_variant(&self, seed: &str) -> Result<String, ServiceError> {
        let sentence = self
            .ask_generate(Some(TUTOR_SYSTEM_PROMPT), &correct_variant_prompt(seed))
            .await?;
        Ok(clean_sentence(&sentence))
    }

    async fn list_incorrect_sentences(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        let listed = self
            .ask_check(Some(TUTOR_SYSTEM_PROMPT), &list_incorrect_prompt(text))
            .await?;
        Ok(split_pipe_list(&listed))
    }

    async fn correct_sentences(&self, sentences: &[String]) -> Result<Vec<String>, ServiceError> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let corrected = self
            .ask_check(Some(TUTOR_SYSTEM_PROMPT), &correct_list_prompt(sentences))
            .await?;
        Ok(split_pipe_list(&corrected))
    }
}
