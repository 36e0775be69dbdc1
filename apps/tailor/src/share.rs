//! Social share links for a tailored-resume result page.

use reqwest::Url;

pub const DEFAULT_TITLE: &str = "Check this out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub linkedin: Url,
    pub x: Url,
    pub reddit: Url,
}

/// Builds the share links, or `None` if `url` is not an absolute URL.
pub fn share_links(url: &str, title: Option<&str>, text: &str) -> Option<ShareLinks> {
    let target = Url::parse(url.trim()).ok()?;
    let target = target.as_str();
    let title = title.filter(|t| !t.trim().is_empty()).unwrap_or(DEFAULT_TITLE);

    Some(ShareLinks {
        linkedin: Url::parse_with_params(
            "https://www.linkedin.com/shareArticle",
            &[("mini", "true"), ("url", target), ("title", title), ("summary", text)],
        )
        .ok()?,
        x: Url::parse_with_params(
            "https://twitter.com/intent/tweet",
            &[("url", target), ("text", title)],
        )
        .ok()?,
        reddit: Url::parse_with_params(
            "https://www.reddit.com/submit",
            &[("url", target), ("title", title)],
        )
        .ok()?,
    })
}
