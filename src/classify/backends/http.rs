use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use url::Url;

use crate::classify::backend::Classifier;
use crate::classify::result::ClassifierResult;
use crate::error::ClassifierUnavailable;

#[derive(Serialize)]
struct InferRequest<'a> {
    frame: &'a str,
}

/// Remote classifier reached over HTTP.
///
/// Sends `POST <url>` with `{"frame": "<data uri>"}` and expects the
/// four-channel JSON object back. Requests time out after the configured
/// duration so a hung backend cannot stall the tick loop.
pub struct HttpClassifier {
    agent: ureq::Agent,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(url).context("parse classifier url")?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported classifier scheme '{}'; expected http(s)",
                parsed.scheme()
            ));
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            url: parsed.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Classifier for HttpClassifier {
    fn name(&self) -> &'static str {
        "http"
    }

    fn classify(&mut self, frame_data_uri: &str) -> Result<ClassifierResult, ClassifierUnavailable> {
        let response = self
            .agent
            .post(&self.url)
            .send_json(InferRequest {
                frame: frame_data_uri,
            })
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => ClassifierUnavailable::Status(code),
                ureq::Error::Transport(transport) => {
                    ClassifierUnavailable::Transport(transport.to_string())
                }
            })?;
        let body = response
            .into_string()
            .map_err(|err| ClassifierUnavailable::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| ClassifierUnavailable::Malformed(err.to_string()))
    }
}
