use std::pin::pin;

use cofrito_protocol::{HINT_ENDPOINT, HintQuery, HintReply};
use futures_util::future::{Either, select};
use gloo::net::http::Request;
use gloo::timers::future::TimeoutFuture;

/// Bound on how long a hint request may stay outstanding; a timeout takes
/// the same silent fallback path as a parse failure.
pub(crate) const HINT_TIMEOUT_MS: u32 = 8_000;

/// How long the suggested slot stays highlighted unless a new hint lands.
pub(crate) const HIGHLIGHT_MS: u32 = 3_000;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum HintFetch {
    /// The raw oracle suggestion, still to be parsed and validated.
    Reply(String),
    /// Transport error, non-success reply, or timeout.
    Failed,
}

/// Posts one hint query to the relay, racing it against the timeout. All
/// failure shapes collapse into [`HintFetch::Failed`]; the caller recovers
/// with the local random fallback and never surfaces an error.
pub(crate) async fn request_hint(query: HintQuery) -> HintFetch {
    let request = async {
        let response = Request::post(HINT_ENDPOINT)
            .json(&query)
            .ok()?
            .send()
            .await
            .ok()?;
        if !response.ok() {
            log::debug!("hint relay answered {}", response.status());
            return None;
        }
        let reply: HintReply = response.json().await.ok()?;
        reply.success.then_some(reply.suggestion)
    };

    let outcome = match select(pin!(request), pin!(TimeoutFuture::new(HINT_TIMEOUT_MS))).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(_) => {
            log::debug!("hint request timed out after {}ms", HINT_TIMEOUT_MS);
            None
        }
    };

    match outcome {
        Some(suggestion) => HintFetch::Reply(suggestion),
        None => HintFetch::Failed,
    }
}
