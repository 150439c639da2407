use clap::Parser;
use yt_auth::{AuthConfig, Authenticator};

/// OAuth 2.0 helper tool for YouTube API authentication
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// OAuth client ID
    #[arg(long, required = true)]
    client_id: String,

    /// OAuth client secret
    #[arg(long, required = true)]
    client_secret: String,

    /// Path to the OAuth token file
    #[arg(long, default_value = "yt_token.json")]
    token_path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let auth = Authenticator::new(AuthConfig::new(args.client_id, args.client_secret));

    let token = auth.authorize(&args.token_path).await?;

    eprintln!("Validating YouTube token...");
    if auth.validate(&token).await? {
        eprintln!("Token is valid. Saved at: {}", args.token_path);
    } else {
        eprintln!("Token was rejected by the YouTube API");
        std::process::exit(1);
    }

    Ok(())
}
