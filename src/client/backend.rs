//! Pluggable chat backend trait.
//!
//! [`UpstreamClient`](super::UpstreamClient) owns the request mapping, logging
//! and connection checks; a backend only moves an [`UpstreamRequest`] over the wire.

use async_trait::async_trait;

use super::message::{UpstreamRequest, UpstreamResponse};
use crate::error::ClientError;

/// Transport for chat completion calls.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes one chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the API rejects the call and
    /// [`ClientError::Unexpected`] for transport or decoding failures.
    async fn complete(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, ClientError>;
}
