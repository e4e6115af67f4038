//! Adapters implementing the domain ports against real systems.
//!
//! - `search`: Bing image search as a candidate source
//! - `http`: image downloads
//! - `render`: labeled grid composites
//! - `judges`: vision-model judges behind a provider registry
//! - `mock`: scripted collaborators for tests and dry runs

pub mod http;
pub mod judges;
pub mod mock;
pub mod render;
pub mod search;
