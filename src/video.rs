use url::Url;

/// Extract the video ID from a YouTube URL.
///
/// Accepts both long-form watch URLs (`https://www.youtube.com/watch?v=<id>`)
/// and short links (`https://youtu.be/<id>`). Returns `None` for anything
/// else so the caller can bail out before touching the network.
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;

    match url.host_str()? {
        "www.youtube.com" | "youtube.com" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" => {
            let id = url.path().trim_start_matches('/');
            if id.is_empty() {
                None
            } else {
                Some(id.to_string())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn parses_watch_url_without_www() {
        assert_eq!(
            extract_video_id("https://youtube.com/watch?v=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn parses_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn picks_v_among_other_query_parameters() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=42&v=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn rejects_other_hosts() {
        assert_eq!(extract_video_id("https://example.com/video"), None);
    }

    #[test]
    fn rejects_watch_url_without_video_parameter() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch"), None);
    }

    #[test]
    fn rejects_empty_short_url_path() {
        assert_eq!(extract_video_id("https://youtu.be/"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(extract_video_id("not a url"), None);
    }
}
