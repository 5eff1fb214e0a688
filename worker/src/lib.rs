//! Relay between the web client and the language-model API serving the
//! hint oracle. The game never talks upstream directly: it posts a
//! [`HintQuery`] here and gets a [`HintReply`] back, whatever happens.

use cofrito_protocol::{HINT_ENDPOINT, HintQuery, HintReply, oracle_messages};
use serde_json::json;
use worker::*;

const UPSTREAM_URL: &str = "https://api.perplexity.ai/chat/completions";
const UPSTREAM_MODEL: &str = "llama-3.1-sonar-small-128k-online";
const API_KEY_SECRET: &str = "PERPLEXITY_API_KEY";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f64 = 0.7;

#[event(fetch)]
pub async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    Router::new()
        .post_async(HINT_ENDPOINT, hint)
        .run(req, env)
        .await
}

async fn hint(mut req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let query: HintQuery = match req.json().await {
        Ok(query) => query,
        Err(err) => {
            console_log!("rejecting malformed hint query: {}", err);
            return failure(400);
        }
    };

    let api_key = match ctx.env.secret(API_KEY_SECRET) {
        Ok(secret) => secret.to_string(),
        Err(_) => {
            console_error!("{} is not configured", API_KEY_SECRET);
            return failure(500);
        }
    };

    let upstream = match call_oracle(&query, &api_key).await {
        Ok(value) => value,
        Err(err) => {
            console_error!("oracle call failed: {}", err);
            return failure(502);
        }
    };

    match extract_suggestion(&upstream) {
        Some(suggestion) => Response::from_json(&HintReply {
            success: true,
            suggestion: suggestion.to_string(),
        }),
        None => {
            console_error!("oracle reply had no content");
            failure(502)
        }
    }
}

async fn call_oracle(query: &HintQuery, api_key: &str) -> Result<serde_json::Value> {
    let (system, user) = oracle_messages(query);
    let body = json!({
        "model": UPSTREAM_MODEL,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
    });

    let mut headers = Headers::new();
    headers.set("Authorization", &format!("Bearer {}", api_key))?;
    headers.set("Content-Type", "application/json")?;

    let init = RequestInit {
        method: Method::Post,
        headers,
        body: Some(serde_json::to_string(&body)?.into()),
        ..RequestInit::default()
    };
    let request = Request::new_with_init(UPSTREAM_URL, &init)?;

    let mut response = Fetch::Request(request).send().await?;
    if response.status_code() != 200 {
        return Err(Error::RustError(format!(
            "upstream answered {}",
            response.status_code()
        )));
    }
    response.json().await
}

/// First choice's message content, the shape chat-completions APIs share.
fn extract_suggestion(value: &serde_json::Value) -> Option<&str> {
    value
        .pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
}

/// Every failure shape degrades to the same reply; the client falls back
/// to a local random suggestion and never shows the player an error.
fn failure(status: u16) -> Result<Response> {
    Ok(Response::from_json(&HintReply::unavailable())?.with_status(status))
}
