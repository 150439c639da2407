use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::progress::Progress;

/// Default base URL for the chat-completion API
pub const DEFAULT_API_ADDRESS: &str = "https://openrouter.ai/api/v1";

/// Default model identifier for classification requests
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat:free";

/// Default number of comments per classification request
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Classification outcome for a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// The comment promotes online gambling
    Positive,
    /// The comment does not promote online gambling
    Negative,
    /// The label could not be determined (API or parse failure)
    Unknown,
}

impl Label {
    /// CSV field value: `1`, `0`, or empty for unknown
    pub fn csv_field(&self) -> &'static str {
        match self {
            Label::Positive => "1",
            Label::Negative => "0",
            Label::Unknown => "",
        }
    }
}

/// What to do with a reply token that is neither `"1"` nor `"0"`.
///
/// The original heuristic folds everything non-`"1"` into a negative
/// classification, which conflates parse failures with genuine negatives.
/// Both readings are kept available; `Negative` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnparsedPolicy {
    #[default]
    Negative,
    Unknown,
}

/// Split comments into classification batches of at most `size`,
/// preserving order. The last batch may be smaller.
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// Build the classification prompt for one batch.
///
/// The model is told to answer with one numbered line per comment,
/// `1` for gambling promotion and `0` otherwise, with no extra
/// formatting characters.
pub fn build_prompt(batch: &[String]) -> String {
    let mut lines = vec![
        "Classify the following YouTube comments as promoting judi online (online gambling) or not.".to_string(),
        "Add the sequence and (only) reply by number 1 (yes) or 0 (no) every sentence each line.".to_string(),
        "Expected answer:\n1. YOUR_ANSWER\n2. YOUR_ANSWER\n3. YOUR_ANSWER\nso on...".to_string(),
        "Please remove any symbol like * or #. Make it clean!".to_string(),
    ];

    for (index, comment) in batch.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, comment));
    }

    lines.join("\n")
}

/// Parse the model's reply into labels, one per reply line.
///
/// Line i is taken to answer comment i; the leading number is stripped,
/// never trusted. A line containing `.` loses everything through the
/// first `.` plus surrounding whitespace; a line without `.` is used
/// verbatim. Token `"1"` is positive, `"0"` is negative, anything else
/// falls to the configured policy.
pub fn parse_reply(content: &str, policy: UnparsedPolicy) -> Vec<Label> {
    content
        .trim()
        .lines()
        .map(|line| {
            let token = match line.split_once('.') {
                Some((_, rest)) => rest.trim(),
                None => line,
            };
            match token {
                "1" => Label::Positive,
                "0" => Label::Negative,
                _ => match policy {
                    UnparsedPolicy::Negative => Label::Negative,
                    UnparsedPolicy::Unknown => Label::Unknown,
                },
            }
        })
        .collect()
}

/// Force a label sequence to length `n`: pad with unknown when short,
/// drop the tail when long. Guarantees every comment keeps its row.
pub fn align(mut labels: Vec<Label>, n: usize) -> Vec<Label> {
    if labels.len() < n {
        labels.resize(n, Label::Unknown);
    } else {
        labels.truncate(n);
    }
    labels
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Submits comment batches to the chat-completion API for labeling.
pub struct LabelRequester {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    batch_size: usize,
    delay: Duration,
    policy: UnparsedPolicy,
}

impl LabelRequester {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        batch_size: usize,
        delay: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            batch_size: batch_size.max(1),
            delay,
            policy: UnparsedPolicy::default(),
        }
    }

    /// Override the fallback for unparseable reply tokens
    pub fn with_unparsed_policy(mut self, policy: UnparsedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Label every comment, one request per batch, waiting the fixed
    /// delay after each batch regardless of outcome. The returned vector
    /// always has exactly one label per comment.
    pub async fn label_all(&self, comments: &[String], progress: &dyn Progress) -> Vec<Label> {
        let batch_count = batches(comments, self.batch_size).count();
        progress.labeling_started(batch_count);

        let mut labels: Vec<Label> = Vec::with_capacity(comments.len());
        for (index, batch) in batches(comments, self.batch_size).enumerate() {
            labels.extend(self.label_batch(batch).await);
            progress.batch_labeled(index, batch_count);
            tokio::time::sleep(self.delay).await;
        }

        labels
    }

    /// Label one batch. Any failure (HTTP error, malformed reply,
    /// missing content) degrades to all-unknown for the batch instead
    /// of aborting the run.
    pub async fn label_batch(&self, batch: &[String]) -> Vec<Label> {
        match self.request_labels(batch).await {
            Ok(labels) => labels,
            Err(e) => {
                eprintln!("Label request failed, marking batch unknown: {}", e);
                vec![Label::Unknown; batch.len()]
            }
        }
    }

    async fn request_labels(&self, batch: &[String]) -> Result<Vec<Label>, Box<dyn std::error::Error>> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": build_prompt(batch) }
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("chat completion returned status {}: {}", status, body).into());
        }

        let body: serde_json::Value = response.json().await?;
        labels_from_reply(body, batch.len(), self.policy)
    }
}

/// Turn a chat-completion reply body into exactly `n` labels. A body
/// without the expected `choices[0].message.content` path is an error;
/// the caller degrades it to an all-unknown batch.
fn labels_from_reply(
    body: serde_json::Value,
    n: usize,
    policy: UnparsedPolicy,
) -> Result<Vec<Label>, Box<dyn std::error::Error>> {
    let reply: ChatCompletionReply = serde_json::from_value(body)
        .map_err(|e| format!("Malformed chat completion reply: {}", e))?;

    let content = reply
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or("Chat completion reply has no choices")?;

    Ok(align(parse_reply(&content, policy), n))
}
