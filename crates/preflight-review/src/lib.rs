//! Client for the external policy-review workflow.
//!
//! Two ways of talking to the workflow:
//! - [`ReviewClient::trigger`] starts a hybrid review that reports back
//!   through a callback URL and may also answer synchronously
//! - [`ReviewClient::check_video`] / [`ReviewClient::check_landing_page`]
//!   run a blocking review and parse its reply into a `PolicyResult`

pub mod client;
pub mod error;
pub mod types;

pub use client::{ReviewClient, ReviewClientConfig};
pub use error::{ReviewError, ReviewResult};
pub use types::{
    interpret_landing_page_reply, interpret_video_reply, LandingPageReviewReply, TriggerPayload,
    VideoReviewReply,
};
