//! Yes/no/maybe probes answered by the LLM.

use std::sync::Arc;

use ragdesk_core::config::RouterConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::provider::{GenerateParams, Provider};

/// Parsed answer to a probe question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Yes,
    No,
    Maybe,
}

/// Maps a free-text probe answer onto a `Verdict`.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, response: &str) -> Result<Verdict>;
}

/// Case-insensitive substring matching. Negative markers win over everything
/// else, so "Notably, yes" parses as `No` with the default markers. Text that
/// matches no marker at all is ambiguous.
#[derive(Debug, Clone)]
pub struct SubstringParser {
    negative: Vec<String>,
    positive: Vec<String>,
    hedge: Vec<String>,
}

impl SubstringParser {
    pub fn new(negative: Vec<String>, positive: Vec<String>, hedge: Vec<String>) -> Self {
        let lower = |v: Vec<String>| v.into_iter().map(|s| s.to_lowercase()).collect();
        Self {
            negative: lower(negative),
            positive: lower(positive),
            hedge: lower(hedge),
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(
            config.negative_markers.clone(),
            config.positive_markers.clone(),
            config.hedge_markers.clone(),
        )
    }
}

impl Default for SubstringParser {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

impl ResponseParser for SubstringParser {
    fn parse(&self, response: &str) -> Result<Verdict> {
        if !response.chars().any(char::is_alphanumeric) {
            return Err(RagDeskError::ParseAmbiguity(response.to_string()));
        }
        let text = response.to_lowercase();
        let has = |markers: &[String]| markers.iter().any(|m| text.contains(m.as_str()));

        if has(&self.negative) {
            Ok(Verdict::No)
        } else if has(&self.positive) {
            Ok(Verdict::Yes)
        } else if has(&self.hedge) {
            Ok(Verdict::Maybe)
        } else {
            Err(RagDeskError::ParseAmbiguity(response.to_string()))
        }
    }
}

/// Fills a probe template with the query, asks the LLM and parses the answer.
pub struct ProbeClassifier {
    provider: Arc<dyn Provider>,
    parser: Box<dyn ResponseParser>,
    params: GenerateParams,
}

impl ProbeClassifier {
    pub fn new(
        provider: Arc<dyn Provider>,
        parser: Box<dyn ResponseParser>,
        params: GenerateParams,
    ) -> Self {
        Self {
            provider,
            parser,
            params,
        }
    }

    /// `{query}` in the template is replaced by the query text.
    pub async fn classify(&self, probe_template: &str, query: &str) -> Result<Verdict> {
        let prompt = probe_template.replace("{query}", query);
        let answer = self.provider.generate(&prompt, &self.params).await?;
        let verdict = self.parser.parse(&answer)?;
        tracing::debug!("probe answer {:?} → {:?}", answer.trim(), verdict);
        Ok(verdict)
    }
}
