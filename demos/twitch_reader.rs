//! Anonymous Twitch chat reader
//!
//! Connects to Twitch over WebSocket as `justinfan12345`, joins the channels
//! given on the command line and prints chat as it arrives.
//!
//! ```text
//! cargo run --example twitch_reader -- rust gamesdonequick
//! ```

use futures_util::StreamExt;
use slirc_client::{Client, ClientConfig, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let channels: Vec<String> = std::env::args().skip(1).collect();
    if channels.is_empty() {
        eprintln!("usage: twitch_reader <channel>...");
        return Ok(());
    }

    let (mut client, mut commands) = Client::connect(ClientConfig::twitch()).await?;
    client.registered().await?;
    println!("✓ Registered");

    for channel in &channels {
        client.join(channel).await?;
        println!("→ JOIN {}", channel);
    }

    while let Some(command) = commands.next().await {
        match command? {
            Command::Privmsg {
                message,
                target,
                text,
                is_action,
            } => {
                let nick = message
                    .unescaped_tag_value("display-name")
                    .or_else(|| message.source_nickname().map(str::to_owned))
                    .unwrap_or_default();
                if is_action {
                    println!("[{}] * {} {}", target, nick, text);
                } else {
                    println!("[{}] <{}> {}", target, nick, text);
                }
            }
            Command::Notice { target, text, .. } => println!("[{}] -!- {}", target, text),
            Command::Invalid { raw_line, error, .. } => {
                eprintln!("← unparsed line {:?}: {}", raw_line, error)
            }
            Command::Error { text, .. } => {
                eprintln!("server error: {}", text);
                break;
            }
            _ => {}
        }
    }

    client.dispose().await;
    Ok(())
}
