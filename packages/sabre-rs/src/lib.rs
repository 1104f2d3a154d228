//! Compile a Solidity contract and submit it to a remote security analysis service.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod report;
