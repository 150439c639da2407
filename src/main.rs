use std::time::Duration;

use clap::Parser;
use yt_comment_labeler::classify::{self, LabelRequester};
use yt_comment_labeler::comments::{self, CommentSource};
use yt_comment_labeler::config::Config;
use yt_comment_labeler::output;
use yt_comment_labeler::progress::ConsoleProgress;
use yt_comment_labeler::video::extract_video_id;

/// YouTube Comment Labeler - Flags online-gambling spam in video comments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YouTube video URL (watch?v= or youtu.be form)
    #[arg(short, long)]
    url: String,

    /// Output CSV file (default: outputs/labeled_<video-id>_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<String>,

    /// Maximum number of comments to fetch
    #[arg(short, long, default_value = "100")]
    limit: usize,

    /// Comments per classification request
    #[arg(long, default_value_t = classify::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Wait time in seconds after each classification request
    #[arg(long, default_value = "5")]
    delay_secs: u64,

    /// Model identifier for classification requests
    #[arg(long, default_value = classify::DEFAULT_MODEL)]
    model: String,

    /// Path to the JSON config file holding both API keys
    #[arg(long, default_value = "config.json")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Config::load_from_file(&args.config)?;

    let Some(video_id) = extract_video_id(&args.url) else {
        eprintln!("Invalid YouTube URL: {}", args.url);
        return Ok(());
    };
    eprintln!("Using video ID: {}", video_id);

    let youtube_address = std::env::var("YOUTUBE_API_ADDRESS")
        .unwrap_or_else(|_| comments::DEFAULT_API_ADDRESS.to_string());
    let openrouter_address = std::env::var("OPENROUTER_API_ADDRESS")
        .unwrap_or_else(|_| classify::DEFAULT_API_ADDRESS.to_string());

    let progress = ConsoleProgress;

    let source = CommentSource::new(youtube_address, config.youtube_api_key);
    let comments = source.fetch(&video_id, args.limit, &progress).await;

    if comments.is_empty() {
        eprintln!("No comments fetched.");
        return Ok(());
    }

    let requester = LabelRequester::new(
        openrouter_address,
        config.deepseek_api_key,
        args.model,
        args.batch_size,
        Duration::from_secs(args.delay_secs),
    );
    let labels = requester.label_all(&comments, &progress).await;

    let output_path = args
        .output
        .unwrap_or_else(|| output::default_output_path(&video_id));
    output::write_csv(&output_path, &comments, labels, &progress)?;

    Ok(())
}
