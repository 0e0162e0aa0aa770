use reqwest::Url;

use crate::error::CoreError;

/// Validate an API base URL and strip trailing slashes so endpoint paths can
/// be appended with a single `/`.
pub fn parse_base_url(base_url: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(base_url).map_err(|e| {
        CoreError::Config(format!(
            "invalid API base URL `{base_url}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(base_url.trim_end_matches('/').to_owned()),
        other => Err(CoreError::Config(format!(
            "unsupported API URL scheme `{other}`; expected http or https"
        ))),
    }
}
