//! Source-URL parsing utilities.

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YoutubeIdError {
    /// URL is not a YouTube URL
    InvalidYoutubeUrl,
    /// Video ID has invalid format
    InvalidVideoId,
    /// Video ID not found in URL
    VideoIdNotFound,
}

impl std::fmt::Display for YoutubeIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YoutubeIdError::InvalidYoutubeUrl => write!(f, "URL is not a valid YouTube URL"),
            YoutubeIdError::InvalidVideoId => write!(f, "Video ID has invalid format"),
            YoutubeIdError::VideoIdNotFound => write!(f, "Video ID not found in URL"),
        }
    }
}

impl std::error::Error for YoutubeIdError {}

/// Extract a YouTube video ID from a URL.
///
/// Supports the common URL shapes:
/// - `https://youtube.com/watch?v=VIDEO_ID`
/// - `https://youtu.be/VIDEO_ID`
/// - `https://youtube.com/embed/VIDEO_ID`
/// - `https://youtube.com/shorts/VIDEO_ID`
///
/// Returns the 11-character video ID or an error.
pub fn extract_youtube_id(url: &str) -> Result<String, YoutubeIdError> {
    let url = url.trim();

    if !is_youtube_domain(url) {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    for extractor in [
        extract_from_watch_url,
        extract_from_short_url,
        extract_from_path_url,
    ] {
        if let Some(id) = extractor(url) {
            return validate_youtube_id(id);
        }
    }

    Err(YoutubeIdError::VideoIdNotFound)
}

fn is_youtube_domain(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// `youtube.com/watch?v=VIDEO_ID` (with or without extra query params).
fn extract_from_watch_url(url: &str) -> Option<String> {
    let v_pos = url.find("?v=").or_else(|| url.find("&v="))?;
    extract_id_from_segment(&url[v_pos + 3..])
}

/// `youtu.be/VIDEO_ID`
fn extract_from_short_url(url: &str) -> Option<String> {
    let be_pos = url.find("youtu.be/")?;
    extract_id_from_segment(url.get(be_pos + 9..)?)
}

/// `youtube.com/embed/VIDEO_ID`, `/v/VIDEO_ID`, `/shorts/VIDEO_ID`
fn extract_from_path_url(url: &str) -> Option<String> {
    for prefix in ["/embed/", "/v/", "/shorts/"] {
        if let Some(pos) = url.find(prefix) {
            return extract_id_from_segment(url.get(pos + prefix.len()..)?);
        }
    }
    None
}

/// Take characters up to the first URL delimiter.
fn extract_id_from_segment(segment: &str) -> Option<String> {
    let id: String = segment
        .chars()
        .take_while(|c| !matches!(c, '?' | '&' | '#' | '/'))
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// YouTube video IDs are exactly 11 chars of [A-Za-z0-9_-].
fn validate_youtube_id(id: String) -> Result<String, YoutubeIdError> {
    if id.len() != 11 {
        return Err(YoutubeIdError::InvalidVideoId);
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(YoutubeIdError::InvalidVideoId);
    }
    Ok(id)
}
