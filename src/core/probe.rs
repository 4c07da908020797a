//! Fetching pages and counting elements by class.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::core::monitor::Sample;

/// Why a page could not be sampled
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },
}

/// Source of page samples
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str, selector: &str) -> Result<Sample, ProbeError>;
}

/// Probe a page, turning any failure into the unreachable sentinel.
pub async fn probe_or_sentinel(prober: &dyn Prober, url: &str, selector: &str) -> Sample {
    match prober.probe(url, selector).await {
        Ok(sample) => sample,
        Err(e) => {
            log::warn!("{}", e);
            Sample::unreachable()
        }
    }
}

/// Count elements whose `class` attribute contains `class` as a substring.
pub fn count_elements_with_class(html: &str, class: &str) -> u32 {
    let document = scraper::Html::parse_document(html);
    let count = document
        .tree
        .nodes()
        .filter_map(|node| node.value().as_element())
        .filter(|element| {
            element
                .attr("class")
                .is_some_and(|value| value.contains(class))
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Prober backed by plain HTTP GET requests
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, selector: &str) -> Result<Sample, ProbeError> {
        let unreachable = |reason: String| ProbeError::Unreachable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        let status_code = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| unreachable(format!("failed to read body: {}", e)))?;

        let element_count = count_elements_with_class(&body, selector);
        log::debug!(
            "{} -> status {}, {} elements with class '{}'",
            url,
            status_code,
            element_count,
            selector
        );

        Ok(Sample::new(status_code, element_count))
    }
}
