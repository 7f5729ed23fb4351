//! services/api/src/adapters/study_llm.rs
//!
//! This module contains the adapter for the study-material LLM.
//! It implements the `StudyMaterialService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use study_buddy_core::{
    domain::{Flashcard, QuizQuestion},
    generation::{
        parse_flashcards, parse_quiz, study_material_prompt, FLASHCARD_INSTRUCTIONS,
        QUIZ_INSTRUCTIONS,
    },
    ports::{PortError, PortResult, StudyMaterialService},
};
use tracing::{debug, info};

const CHAT_INSTRUCTIONS: &str = "You are a friendly study assistant. Answer the student's question clearly and concisely.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Model names used for each kind of request.
#[derive(Clone, Debug)]
pub struct StudyModels {
    pub flashcards: String,
    pub quiz: String,
    pub chat: String,
}

/// An adapter that implements `StudyMaterialService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiStudyAdapter {
    client: Client<OpenAIConfig>,
    models: StudyModels,
    document_char_limit: usize,
}

impl OpenAiStudyAdapter {
    /// Creates a new `OpenAiStudyAdapter`.
    pub fn new(client: Client<OpenAIConfig>, models: StudyModels, document_char_limit: usize) -> Self {
        Self {
            client,
            models,
            document_char_limit,
        }
    }

    /// Sends one system + user exchange and returns the first choice's text.
    async fn complete(&self, model: &str, instructions: &str, input: String) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Unexpected("LLM response contained no text content.".to_string()))
    }
}

//=========================================================================================
// `StudyMaterialService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyMaterialService for OpenAiStudyAdapter {
    async fn generate_flashcards(&self, document: &str) -> PortResult<Vec<Flashcard>> {
        let prompt = study_material_prompt(document, self.document_char_limit);
        let raw = self
            .complete(&self.models.flashcards, FLASHCARD_INSTRUCTIONS, prompt)
            .await?;
        debug!("Raw flashcard response: {}", raw);

        let cards = parse_flashcards(&raw);
        info!("Generated {} flashcards", cards.len());
        Ok(cards)
    }

    async fn generate_quiz(&self, document: &str) -> PortResult<Vec<QuizQuestion>> {
        let prompt = study_material_prompt(document, self.document_char_limit);
        let raw = self
            .complete(&self.models.quiz, QUIZ_INSTRUCTIONS, prompt)
            .await?;
        debug!("Raw quiz response: {}", raw);

        let questions = parse_quiz(&raw);
        info!("Generated {} quiz questions", questions.len());
        Ok(questions)
    }

    async fn chat(&self, message: &str) -> PortResult<String> {
        let answer = self
            .complete(&self.models.chat, CHAT_INSTRUCTIONS, message.to_string())
            .await?;
        Ok(answer.trim().to_string())
    }
}
