pub mod http;

pub use http::{HttpApiClient, ModerationApi};
