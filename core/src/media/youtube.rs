use url::form_urlencoded;

use crate::config::EmbedConfig;

const SHORT_LINK: &str = "youtu.be/";
const WATCH: &str = "youtube.com/watch";
const EMBED: &str = "youtube.com/embed/";

/// Textual shapes of links to the short-video host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// youtu.be/ID
    ShortLink,
    /// youtube.com/watch?v=ID
    Watch,
    /// youtube.com/embed/ID, already usable in a frame
    Embed,
    Other,
}

pub(crate) fn shape(url: &str) -> UrlShape {
    if url.contains(SHORT_LINK) {
        UrlShape::ShortLink
    } else if url.contains(WATCH) {
        UrlShape::Watch
    } else if url.contains(EMBED) {
        UrlShape::Embed
    } else {
        UrlShape::Other
    }
}

/// Check if a URL is one of the recognised YouTube shapes
pub fn is_youtube_url(url: &str) -> bool {
    shape(url) != UrlShape::Other
}

/// Extract the video id from a short link, watch or embed URL.
/// Returns `None` when the shape matches but the id is empty or absent.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let id = match shape(url) {
        UrlShape::ShortLink => path_segment_after(url, SHORT_LINK),
        UrlShape::Embed => path_segment_after(url, EMBED),
        UrlShape::Watch => {
            let query = url.split_once('?').map(|(_, q)| q)?;
            let query = query.split('#').next().unwrap_or_default();
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        }
        UrlShape::Other => None,
    }?;

    if id.is_empty() { None } else { Some(id) }
}

fn path_segment_after(url: &str, marker: &str) -> Option<String> {
    let start = url.find(marker)? + marker.len();
    let rest = &url[start..];
    let end = rest.find(&['&', '#', '?', '/'][..]).unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// Canonical frame URL for a video id
pub fn embed_url(id: &str, config: &EmbedConfig) -> String {
    format!("https://www.youtube.com/embed/{}?{}", id, config.query())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(shape("https://youtu.be/abc"), UrlShape::ShortLink);
        assert_eq!(shape("youtube.com/watch?v=abc"), UrlShape::Watch);
        assert_eq!(shape("https://www.youtube.com/embed/abc"), UrlShape::Embed);
        assert_eq!(shape("https://example.com/a.mp4"), UrlShape::Other);
        assert!(!is_youtube_url("https://www.youtube.com/@channel"));
    }

    #[test]
    fn test_extract_id_variants() {
        assert_eq!(extract_youtube_id("https://youtu.be/abc123/").as_deref(), Some("abc123"));
        assert_eq!(extract_youtube_id("https://youtu.be/abc123#t=3").as_deref(), Some("abc123"));
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?feature=share&v=a%2Db#frag").as_deref(),
            Some("a-b")
        );
        assert_eq!(extract_youtube_id("https://www.youtube.com/embed/xyz?rel=0").as_deref(), Some("xyz"));
        assert_eq!(extract_youtube_id("https://www.youtube.com/watch"), None);
        assert_eq!(extract_youtube_id("https://example.com/v.mp4"), None);
    }

    #[test]
    fn test_embed_url_honours_flags() {
        let config = EmbedConfig {
            autoplay: false,
            related: true,
            ..Default::default()
        };
        assert_eq!(
            embed_url("abc", &config),
            "https://www.youtube.com/embed/abc?autoplay=0&controls=1&modestbranding=1&rel=1"
        );
    }
}
