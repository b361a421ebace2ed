use std::sync::Arc;

use anyhow::Context;

use huixing_partner::client::config::ClientConfig;
use huixing_partner::client::services::notifier::LogNotifier;
use huixing_partner::client::session::Session;
use huixing_partner::common::chat::ChatId;
use huixing_partner::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let chat_id: ChatId = std::env::args()
        .nth(1)
        .context("usage: chat-tail <user_<id>|team_<id>>")?
        .parse()?;

    let session = Session::new(ClientConfig::from_env(), Arc::new(LogNotifier))?;
    if !session.restore().await {
        println!("No saved session, messages will not be marked as yours. Log in with partner-cli first.");
    }

    let mut channel = session.open_chat(chat_id).await?;
    println!("Connecting to {}", channel.url());
    channel.wait_open().await?;
    println!("Listening on {} (Ctrl+C to stop)", chat_id);

    loop {
        tokio::select! {
            message = channel.next() => match message {
                Some(m) => {
                    let who = if m.is_self { "me".to_string() } else { m.sender_name.clone() };
                    println!("[{}] {}: {}", m.timestamp, who, m.content);
                }
                None => {
                    println!("Channel ended: {:?}", channel.state());
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                channel.close().await;
                println!("Closed.");
                break;
            }
        }
    }
    Ok(())
}
