//! SonarQube Web API client

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::extraction::traits::AnalysisBackend;
use crate::sonar::error::BackendError;
use crate::sonar::model::{CleanCodeCategory, IssuesResponse, MeasuresResponse, RawIssue};

const MEASURES_PATH: &str = "/api/measures/component";
const ISSUES_PATH: &str = "/api/issues/search";

/// Largest page the issue search accepts
const MAX_PAGE_SIZE: u32 = 500;
/// Issue search refuses to page past this many results
const MAX_SEARCH_RESULTS: u32 = 10_000;

/// Blocking client for the measures and issue search endpoints
pub struct SonarClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    project_key: Option<String>,
    page_size: u32,
}

impl SonarClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("tagtrend/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            project_key: None,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Restrict issue searches to one project
    pub fn with_project_scope(mut self, project_key: impl Into<String>) -> Self {
        self.project_key = Some(project_key.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.agent.get(&url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        debug!("GET {} {:?}", url, query);
        match request.call() {
            Ok(response) => response.into_json::<T>().map_err(|e| BackendError::Decode {
                url,
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(BackendError::Status { url, status, body })
            }
            Err(ureq::Error::Transport(transport)) => Err(BackendError::Transport {
                url,
                message: transport.to_string(),
            }),
        }
    }
}

impl AnalysisBackend for SonarClient {
    fn get_measures(
        &self,
        component: &str,
        metric_keys: &[String],
    ) -> Result<HashMap<String, String>, BackendError> {
        let keys = metric_keys.join(",");
        let response: MeasuresResponse = self.get_json(
            MEASURES_PATH,
            &[("component", component), ("metricKeys", keys.as_str())],
        )?;

        let measures = response
            .component
            .measures
            .into_iter()
            .filter_map(|measure| measure.value.map(|value| (measure.metric, value)))
            .collect::<HashMap<_, _>>();
        debug!("Received {} measures for {}", measures.len(), component);
        Ok(measures)
    }

    fn get_issues(&self, category: CleanCodeCategory) -> Result<Vec<RawIssue>, BackendError> {
        let page_size = self.page_size.to_string();
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            let page_index = page.to_string();
            let mut query = vec![
                ("cleanCodeAttributeCategories", category.as_str()),
                ("ps", page_size.as_str()),
                ("p", page_index.as_str()),
            ];
            if let Some(project_key) = &self.project_key {
                query.push(("components", project_key.as_str()));
            }

            let response: IssuesResponse = self.get_json(ISSUES_PATH, &query)?;
            let received = response.issues.len();
            issues.extend(response.issues);

            let Some(paging) = response.paging else { break };
            if received == 0 || issues.len() as u32 >= paging.total {
                break;
            }
            if page.saturating_add(1).saturating_mul(self.page_size) > MAX_SEARCH_RESULTS {
                warn!(
                    "{} issue search reports {} results; only the first {} are retrievable",
                    category,
                    paging.total,
                    issues.len()
                );
                break;
            }
            page += 1;
        }

        debug!("Received {} {} issues", issues.len(), category);
        Ok(issues)
    }
}
