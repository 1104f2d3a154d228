//! Transport seam to the remote analysis service and its HTTP implementation.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder as HttpRequest};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Credentials;
use crate::issues::{LocationRef, RawIssue, Severity};
use crate::request::RequestDocument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure of a single service call, before any retry decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },
  #[error("malformed response: {0}")]
  Malformed(String),
}

impl ServiceError {
  /// Transport faults, server errors, and rate limiting.
  pub fn is_transient(&self) -> bool {
    match self {
      ServiceError::Transport(_) => true,
      ServiceError::Http { status, .. } => *status >= 500 || *status == 429,
      ServiceError::Malformed(_) => false,
    }
  }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Job status reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
  Queued,
  Running,
  Finished,
  Failed(Option<String>),
}

impl JobStatus {
  fn parse(status: &str, error: Option<String>) -> ServiceResult<Self> {
    match status {
      "Queued" => Ok(JobStatus::Queued),
      "In progress" | "Running" => Ok(JobStatus::Running),
      "Finished" => Ok(JobStatus::Finished),
      "Error" => Ok(JobStatus::Failed(error)),
      other => Err(ServiceError::Malformed(format!("unknown job status \"{other}\""))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  pub uuid: String,
  pub status: JobStatus,
}

pub trait AnalysisService {
  /// Exchanges credentials for a bearer token.
  fn login(&self, credentials: &Credentials) -> ServiceResult<String>;
  fn submit(&self, token: &str, document: &RequestDocument<'_>) -> ServiceResult<Submission>;
  fn status(&self, token: &str, uuid: &str) -> ServiceResult<JobStatus>;
  fn issues(&self, token: &str, uuid: &str) -> ServiceResult<Vec<RawIssue>>;
}

impl<T: AnalysisService + ?Sized> AnalysisService for &T {
  fn login(&self, credentials: &Credentials) -> ServiceResult<String> {
    (**self).login(credentials)
  }

  fn submit(&self, token: &str, document: &RequestDocument<'_>) -> ServiceResult<Submission> {
    (**self).submit(token, document)
  }

  fn status(&self, token: &str, uuid: &str) -> ServiceResult<JobStatus> {
    (**self).status(token, uuid)
  }

  fn issues(&self, token: &str, uuid: &str) -> ServiceResult<Vec<RawIssue>> {
    (**self).issues(token, uuid)
  }
}

// -----------------------------------------------------------------------------
// Wire format
// -----------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
  eth_address: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
  jwt_tokens: JwtTokens,
}

#[derive(Deserialize)]
struct JwtTokens {
  access: String,
}

#[derive(Deserialize)]
struct StatusResponse {
  uuid: String,
  status: String,
  #[serde(default)]
  error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IssueReport {
  #[serde(default)]
  issues: Vec<WireIssue>,
  #[serde(default)]
  source_format: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssue {
  #[serde(rename = "swcID", default)]
  swc_id: String,
  #[serde(default)]
  swc_title: String,
  #[serde(default)]
  description: Description,
  #[serde(default)]
  severity: String,
  #[serde(default)]
  locations: Vec<WireLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct Description {
  #[serde(default)]
  head: String,
  #[serde(default)]
  tail: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLocation {
  source_map: String,
  #[serde(default)]
  source_format: Option<String>,
}

/// Flattens issue reports; each issue keeps its first source-text location, else its first location.
pub(crate) fn raw_issues(reports: Vec<IssueReport>) -> Vec<RawIssue> {
  reports
    .into_iter()
    .flat_map(|report| {
      let report_format = report.source_format;
      report.issues.into_iter().map(move |issue| {
        let mut locations: Vec<LocationRef> = issue
          .locations
          .into_iter()
          .map(|location| LocationRef {
            source_map: location.source_map,
            source_format: location.source_format.or_else(|| report_format.clone()),
          })
          .collect();
        let text_index = locations.iter().position(|location| {
          matches!(
            location.source_format.as_deref(),
            None | Some("text") | Some("solidity-file")
          )
        });
        let location = match text_index {
          Some(index) => Some(locations.swap_remove(index)),
          None if !locations.is_empty() => Some(locations.swap_remove(0)),
          None => None,
        };

        RawIssue {
          rule_id: issue.swc_id,
          title: issue.swc_title,
          severity: Severity::from_service(&issue.severity),
          location,
          message: issue.description.head,
          detail: issue.description.tail,
        }
      })
    })
    .collect()
}

// -----------------------------------------------------------------------------
// HTTP transport
// -----------------------------------------------------------------------------

/// Blocking HTTP client for the service's REST API. With `echo` set, every request body and raw
/// response is copied to stderr.
pub struct HttpService {
  client: Client,
  base_url: String,
  echo: bool,
}

impl HttpService {
  pub fn new(base_url: impl Into<String>, echo: bool) -> ServiceResult<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|err| ServiceError::Transport(err.to_string()))?;
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      echo,
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url)
  }

  fn echo_request(&self, method: &str, path: &str, body: Option<&impl Serialize>) {
    if !self.echo {
      return;
    }
    eprintln!("> {method} {}", self.url(path));
    if let Some(body) = body {
      match serde_json::to_string_pretty(body) {
        Ok(text) => eprintln!("{text}"),
        Err(err) => eprintln!("<unserialisable body: {err}>"),
      }
    }
  }

  fn send<T: DeserializeOwned>(&self, request: HttpRequest, token: Option<&str>) -> ServiceResult<T> {
    let mut request = request.header(USER_AGENT, concat!("sabre/", env!("CARGO_PKG_VERSION")));
    if let Some(token) = token {
      request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = request
      .send()
      .map_err(|err| ServiceError::Transport(err.to_string()))?;
    let status = response.status();
    let body = response
      .text()
      .map_err(|err| ServiceError::Transport(err.to_string()))?;
    if self.echo {
      eprintln!("< {status}\n{body}");
    }
    tracing::debug!(status = status.as_u16(), bytes = body.len(), "analysis service response");

    if !status.is_success() {
      return Err(ServiceError::Http {
        status: status.as_u16(),
        body,
      });
    }
    serde_json::from_str(&body).map_err(|err| ServiceError::Malformed(err.to_string()))
  }
}

impl AnalysisService for HttpService {
  fn login(&self, credentials: &Credentials) -> ServiceResult<String> {
    let body = LoginBody {
      eth_address: &credentials.eth_address,
      password: &credentials.password,
    };
    self.echo_request("POST", "/auth/login", None::<&LoginBody>);
    let response: LoginResponse = self.send(self.client.post(self.url("/auth/login")).json(&body), None)?;
    Ok(response.jwt_tokens.access)
  }

  fn submit(&self, token: &str, document: &RequestDocument<'_>) -> ServiceResult<Submission> {
    self.echo_request("POST", "/analyses", Some(document));
    let response: StatusResponse =
      self.send(self.client.post(self.url("/analyses")).json(document), Some(token))?;
    Ok(Submission {
      status: JobStatus::parse(&response.status, response.error)?,
      uuid: response.uuid,
    })
  }

  fn status(&self, token: &str, uuid: &str) -> ServiceResult<JobStatus> {
    let path = format!("/analyses/{uuid}");
    self.echo_request("GET", &path, None::<&()>);
    let response: StatusResponse = self.send(self.client.get(self.url(&path)), Some(token))?;
    JobStatus::parse(&response.status, response.error)
  }

  fn issues(&self, token: &str, uuid: &str) -> ServiceResult<Vec<RawIssue>> {
    let path = format!("/analyses/{uuid}/issues");
    self.echo_request("GET", &path, None::<&()>);
    let reports: Vec<IssueReport> = self.send(self.client.get(self.url(&path)), Some(token))?;
    Ok(raw_issues(reports))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transient_classification() {
    assert!(ServiceError::Transport("reset".into()).is_transient());
    for status in [500, 502, 503, 429] {
      assert!(ServiceError::Http { status, body: String::new() }.is_transient());
    }
    for status in [400, 401, 403, 404, 422] {
      assert!(!ServiceError::Http { status, body: String::new() }.is_transient());
    }
    assert!(!ServiceError::Malformed("eof".into()).is_transient());
  }

  #[test]
  fn parses_job_statuses() {
    assert_eq!(JobStatus::parse("Queued", None), Ok(JobStatus::Queued));
    assert_eq!(JobStatus::parse("In progress", None), Ok(JobStatus::Running));
    assert_eq!(JobStatus::parse("Finished", None), Ok(JobStatus::Finished));
    assert_eq!(
      JobStatus::parse("Error", Some("solc crashed".into())),
      Ok(JobStatus::Failed(Some("solc crashed".into())))
    );
    assert!(matches!(
      JobStatus::parse("Paused", None),
      Err(ServiceError::Malformed(_))
    ));
  }

  #[test]
  fn flattens_issue_reports() {
    let body = r#"[
      {
        "issues": [
          {
            "swcID": "SWC-101",
            "swcTitle": "Integer Overflow and Underflow",
            "description": { "head": "The arithmetic operator can overflow.", "tail": "Use SafeMath." },
            "severity": "High",
            "locations": [
              { "sourceMap": "12:1:0", "sourceFormat": "evm-byzantium-bytecode" },
              { "sourceMap": "120:5:1", "sourceFormat": "text" }
            ]
          },
          {
            "swcID": "SWC-103",
            "swcTitle": "Floating Pragma",
            "description": { "head": "A floating pragma is set." },
            "severity": "Low",
            "locations": [{ "sourceMap": "0:23:1" }]
          },
          { "swcID": "SWC-000", "severity": "Whatever" }
        ],
        "sourceType": "raw-bytecode",
        "sourceFormat": "evm-byzantium-bytecode",
        "sourceList": ["0x"]
      }
    ]"#;
    let reports: Vec<IssueReport> = serde_json::from_str(body).expect("reports");
    let issues = raw_issues(reports);
    assert_eq!(issues.len(), 3);

    assert_eq!(issues[0].rule_id, "SWC-101");
    assert_eq!(issues[0].severity, Severity::High);
    assert_eq!(issues[0].detail, "Use SafeMath.");
    let location = issues[0].location.as_ref().expect("location");
    assert_eq!(location.source_map, "120:5:1");

    // location without its own format inherits the report's
    let inherited = issues[1].location.as_ref().expect("location");
    assert_eq!(inherited.source_format.as_deref(), Some("evm-byzantium-bytecode"));

    assert_eq!(issues[2].severity, Severity::Unknown);
    assert!(issues[2].location.is_none());
  }
}
