pub mod app;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod git;
pub mod logging;
pub mod output;
pub mod parsing;
pub mod sonar;
