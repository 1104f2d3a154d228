//! Submission of compiled contracts to a remote security analysis service and normalisation of
//! the findings it reports.

pub mod client;
pub mod clock;
pub mod config;
mod errors;
pub mod issues;
pub mod request;
pub mod service;
pub mod sourcemap;

pub use client::{AnalysisClient, AnalysisResult, AnalysisStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, Credentials, ModeTiming, RetryPolicy};
pub use errors::{Error, Result};
pub use issues::{dedup_and_sort, CanonicalIssue, IssueNormalizer, LocationRef, RawIssue, Severity};
pub use request::{AnalysisMode, AnalysisRequest, CachePolicy, RequestBuilder, RequestOptions};
pub use service::{AnalysisService, HttpService, JobStatus, ServiceError, Submission};
