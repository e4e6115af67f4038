//! Infrastructure layer: configuration, logging, project setup and the HTTP
//! plumbing behind the vision-model judge.

pub mod config;
pub mod http;
pub mod logging;
pub mod setup;
