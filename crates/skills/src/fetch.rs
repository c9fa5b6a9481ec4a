//! Download remote manifest text.

use tracing::debug;

use crate::error::{Error, Result};

/// HTTP client used for remote fetches.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(user_agent).build()?)
}

/// Rewrite a GitHub `blob` page URL to its raw-content URL. Other URLs are
/// returned unchanged.
#[must_use]
pub fn raw_github_url(url: &str) -> String {
    let trimmed = url.trim();
    let Some(path) = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("https://www.github.com/"))
    else {
        return trimmed.to_string();
    };

    let mut parts = path.splitn(4, '/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), Some("blob"), Some(rest)) if !rest.is_empty() => {
            format!("https://raw.githubusercontent.com/{owner}/{repo}/{rest}")
        },
        _ => trimmed.to_string(),
    }
}

/// GET `url` and return the body as text.
///
/// Anything but `200 OK` fails with [`Error::HttpStatus`]. With `max_bytes`
/// the body is read chunk by chunk and abandoned once it grows past the cap.
pub async fn fetch_remote_content(
    client: &reqwest::Client,
    url: &str,
    max_bytes: Option<u64>,
) -> Result<String> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let too_large = |limit| Error::TooLarge {
        url: url.to_string(),
        limit,
    };
    if let (Some(limit), Some(declared)) = (max_bytes, response.content_length())
        && declared > limit
    {
        return Err(too_large(limit));
    }

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if let Some(limit) = max_bytes
            && body.len() as u64 > limit
        {
            return Err(too_large(limit));
        }
    }

    debug!(%url, bytes = body.len(), "fetched remote content");
    Ok(String::from_utf8_lossy(&body).into_owned())
}
