use serde::Deserialize;

use crate::progress::Progress;

/// Default base URL for the YouTube Data API
pub const DEFAULT_API_ADDRESS: &str = "https://www.googleapis.com";

/// One page of the commentThreads endpoint.
///
/// Only the fields the pipeline reads are modeled; items with an
/// unexpected shape are skipped rather than failing the page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsPage {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: Option<ThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: Option<String>,
}

impl CommentThreadsPage {
    /// Display texts of the page's top-level comments, in API order
    fn texts(self) -> Vec<String> {
        self.items
            .into_iter()
            .filter_map(|item| item.snippet?.top_level_comment?.snippet?.text_display)
            .collect()
    }
}

/// Fetches top-level comments for a video, page by page.
pub struct CommentSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CommentSource {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch up to `limit` top-level comments in upload order.
    ///
    /// Paging follows the continuation token returned by the API; the
    /// fetch stops when the limit is reached or no further pages exist.
    /// Any upstream error ends the fetch early and whatever was already
    /// collected is returned, so a mid-run API failure still produces
    /// partial results downstream.
    pub async fn fetch(&self, video_id: &str, limit: usize, progress: &dyn Progress) -> Vec<String> {
        let mut comments: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        progress.fetch_started(limit);

        while comments.len() < limit {
            let page = match self.fetch_page(video_id, page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    eprintln!(
                        "Comment fetch failed after {} comments: {}",
                        comments.len(),
                        e
                    );
                    break;
                }
            };

            let next_token = page.next_page_token.clone();
            for text in page.texts() {
                comments.push(text);
                if comments.len() >= limit {
                    break;
                }
            }

            progress.comments_fetched(comments.len(), limit);

            match next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments
    }

    async fn fetch_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadsPage, Box<dyn std::error::Error>> {
        let url = format!("{}/youtube/v3/commentThreads", self.base_url);

        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("key", self.api_key.as_str()),
            ("textFormat", "plainText"),
            ("maxResults", "100"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("commentThreads returned status {}: {}", status, body).into());
        }

        let page: CommentThreadsPage = response.json().await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_from(value: serde_json::Value) -> CommentThreadsPage {
        serde_json::from_value(value).unwrap()
    }

    fn item(text: &str) -> serde_json::Value {
        json!({
            "snippet": {
                "topLevelComment": {
                    "snippet": { "textDisplay": text }
                }
            }
        })
    }

    #[test]
    fn extracts_comment_texts_in_order() {
        let page = page_from(json!({
            "items": [item("first"), item("second")],
            "nextPageToken": "tok"
        }));
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        assert_eq!(page.texts(), vec!["first", "second"]);
    }

    #[test]
    fn missing_items_means_empty_page() {
        let page = page_from(json!({}));
        assert!(page.next_page_token.is_none());
        assert!(page.texts().is_empty());
    }

    #[test]
    fn skips_items_with_unexpected_shape() {
        let page = page_from(json!({
            "items": [
                item("kept"),
                { "snippet": {} },
                { "snippet": { "topLevelComment": { "snippet": {} } } }
            ]
        }));
        assert_eq!(page.texts(), vec!["kept"]);
    }
}
