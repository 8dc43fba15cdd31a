use std::sync::Arc;

use async_trait::async_trait;
use surveyassist_config::AppConfig;
use surveyassist_core::{
    ChunkReceiver, Message, Provider, ProviderError, ProviderRequest, ProviderResponse, StreamChunk,
};

use crate::{GatewayState, SharedState};

/// Scripted provider for gateway tests. With no verdict configured every
/// `complete` call fails.
#[derive(Default)]
pub struct StubProvider {
    verdict: Option<String>,
    tokens: Vec<String>,
    refuse_streams: bool,
}

impl StubProvider {
    pub fn with_verdict(mut self, verdict: serde_json::Value) -> Self {
        self.verdict = Some(verdict.to_string());
        self
    }

    pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
        self.tokens = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn refusing_streams(mut self) -> Self {
        self.refuse_streams = true;
        self
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        _request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        match &self.verdict {
            Some(content) => Ok(ProviderResponse {
                message: Message::assistant(content.clone()),
                usage: None,
                model: "stub-model".into(),
            }),
            None => Err(ProviderError::Network("connection refused".into())),
        }
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        if self.refuse_streams {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: "overloaded".into(),
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let tokens = self.tokens.clone();
        tokio::spawn(async move {
            for token in tokens {
                let chunk = StreamChunk {
                    content: Some(token),
                    done: false,
                    usage: None,
                };
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: None,
                }))
                .await;
        });
        Ok(rx)
    }
}

pub fn test_state(provider: StubProvider, expose_error_details: bool) -> SharedState {
    let mut config = AppConfig::default();
    config.gateway.expose_error_details = expose_error_details;
    Arc::new(GatewayState::new(Arc::new(provider), &config))
}
