use std::io::Write;
use std::sync::Arc;

use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use huixing_partner::client::config::ClientConfig;
use huixing_partner::client::models::message_store::{CategoryId, MessageItem};
use huixing_partner::client::router::Navigator;
use huixing_partner::client::services::chat_service::DEFAULT_PAGE_SIZE;
use huixing_partner::client::services::notifier::ToastQueue;
use huixing_partner::client::services::teams_service::DEFAULT_LISTING_LIMIT;
use huixing_partner::client::session::Session;
use huixing_partner::client::tabbar::{active_tab_index, TABBAR};
use huixing_partner::common::chat::{ChatId, MessageType};
use huixing_partner::utils::logger;

const MAX_MESSAGE_LEN: usize = 2048;

const HELP: &str = "\
Commands:
  /login <account> <password>   log in and remember the session
  /logout                       end the session
  /me                           show the logged-in profile
  /friends                      list friends
  /requests                     list received and sent friend requests
  /accept <id> | /reject <id>   answer a received friend request
  /revoke <id>                  withdraw a sent friend request
  /teams                        list my teams
  /hot [limit]                  list popular teams
  /search_team <text>           search teams
  /messages [category]          show the notification center
  /history <chatId> [page]      show chat history (chatId: user_<id> | team_<id>)
  /send <chatId> <message>      send a chat message
  /route <path>                 resolve a client route
  /help                         show this help
  /quit                         exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let config = ClientConfig::from_env();
    let toasts = Arc::new(ToastQueue::new(config.toast_capacity));
    let session = Session::new(config, toasts.clone())?;
    let mut navigator = Navigator::default();

    if session.restore().await {
        if let Some(user) = session.current_user().await {
            println!("[CLIENT] Welcome back, {}", user.username);
        }
    }
    println!("[CLIENT] Type /help for the list of commands.");

    let mut input = BufReader::new(stdin());
    let mut line = String::new();
    loop {
        line.clear();
        print!("> ");
        std::io::stdout().flush()?;
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        let mut parts = cmd.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let public_cmds = ["/login", "/route", "/help", "/quit"];
        if !public_cmds.contains(&command) && session.current_user().await.is_none() {
            println!("[CLIENT] You need to /login first.");
            continue;
        }

        match command {
            "/quit" => {
                println!("[CLIENT] Bye.");
                break;
            }
            "/help" => println!("{}", HELP),
            "/login" if args.len() == 2 => {
                if let Ok(user) = session.login(args[0], args[1]).await {
                    println!("[CLIENT] Logged in as {} (id {})", user.username, user.id);
                }
            }
            "/logout" => {
                session.logout().await;
                println!("[CLIENT] Logged out.");
            }
            "/me" => {
                if let Ok(user) = session.refresh_profile().await {
                    println!("{} (@{}, id {})", user.username, user.user_account, user.id);
                    let tags = user.tag_list();
                    if !tags.is_empty() {
                        println!("  tags: {}", tags.join(", "));
                    }
                    if let Some(desc) = user.user_desc.as_deref().filter(|d| !d.is_empty()) {
                        println!("  {}", desc);
                    }
                }
            }
            "/friends" => {
                if session.refresh_friends().await.is_ok() {
                    let store = session.friend_store();
                    let store = store.lock().await;
                    if store.friend_list().is_empty() {
                        println!("[CLIENT] No friends yet.");
                    }
                    for friend in store.friend_list() {
                        println!("  {:>8}  {}", friend.id, friend.username);
                    }
                }
            }
            "/requests" => {
                if session.refresh_friends().await.is_ok() {
                    let store = session.friend_store();
                    let store = store.lock().await;
                    println!("Received ({} unread):", store.unread_request_count());
                    for r in store.received_requests() {
                        let from = r.from_user.as_ref().map(|u| u.username.as_str()).unwrap_or("?");
                        println!("  #{} from {} [{}]", r.id, from, status_label(r.status));
                    }
                    println!("Sent:");
                    for r in store.sent_requests() {
                        println!("  #{} to {} [{}]", r.id, r.to_id, status_label(r.status));
                    }
                }
            }
            "/accept" | "/reject" if args.len() == 1 => match args[0].parse::<u64>() {
                Ok(id) => {
                    if session.respond_to_request(id, command == "/accept").await.is_ok() {
                        println!("[CLIENT] Request #{} {}.", id, if command == "/accept" { "accepted" } else { "rejected" });
                    }
                }
                Err(_) => println!("[CLIENT] Invalid request id."),
            },
            "/revoke" if args.len() == 1 => match args[0].parse::<u64>() {
                Ok(id) => {
                    if session.revoke_request(id).await.is_ok() {
                        println!("[CLIENT] Request #{} revoked.", id);
                    }
                }
                Err(_) => println!("[CLIENT] Invalid request id."),
            },
            "/teams" => {
                if let Ok(teams) = session.refresh_my_teams().await {
                    if teams.is_empty() {
                        println!("[CLIENT] You are not in any team.");
                    }
                    for team in teams {
                        let lock = if team.has_password { " (locked)" } else { "" };
                        println!("  {:>8}  {} {}/{}{}", team.id, team.name, team.join_num, team.max_num, lock);
                    }
                }
            }
            "/hot" => {
                let limit = args.first().and_then(|a| a.parse().ok()).unwrap_or(DEFAULT_LISTING_LIMIT);
                if let Ok(teams) = session.teams().hot(limit, 1).await {
                    for team in teams {
                        println!("  {:>8}  {} {}/{}", team.id, team.team_name, team.user_set.len(), team.max_num);
                    }
                }
            }
            "/search_team" if !args.is_empty() => {
                if let Ok(teams) = session.teams().search(&args.join(" ")).await {
                    if teams.is_empty() {
                        println!("[CLIENT] No team matches.");
                    }
                    for team in teams {
                        println!("  {:>8}  {}", team.id, team.team_name);
                    }
                }
            }
            "/messages" => {
                let wanted: Vec<CategoryId> = match args.first() {
                    Some(name) => match name.parse() {
                        Ok(id) => vec![id],
                        Err(e) => {
                            println!("[CLIENT] {}", e);
                            continue;
                        }
                    },
                    None => CategoryId::ALL.to_vec(),
                };
                for id in &wanted {
                    session.messages().refresh_category(*id).await;
                }
                for id in wanted {
                    let category = session.messages().category(id).await;
                    println!("{} ({}) [{:?}]", category.name, category.count, category.phase());
                    if let Some(err) = &category.error {
                        println!("  error: {}", err);
                    }
                    for item in &category.items {
                        match item {
                            MessageItem::Friend(a) => {
                                let who = a.apply_user.as_ref().map(|u| u.username.as_str()).unwrap_or("?");
                                println!("  #{} {} [{}] {}", a.id, who, status_label(a.status), a.remark.as_deref().unwrap_or(""));
                            }
                            MessageItem::Team(a) => {
                                println!("  #{} {} [{}]", a.id, a.team_name, a.apply_status);
                            }
                        }
                    }
                }
                println!("Total unread: {}", session.messages().total_unread_count().await);
            }
            "/history" if !args.is_empty() => match args[0].parse::<ChatId>() {
                Ok(chat_id) => {
                    let page = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(1);
                    if let Ok(messages) = session.chat().history(chat_id, page, DEFAULT_PAGE_SIZE).await {
                        for m in messages {
                            println!("  [{}] {}: {}", m.timestamp, m.sender_name, m.content);
                        }
                    }
                }
                Err(e) => println!("[CLIENT] {}", e),
            },
            "/send" if args.len() >= 2 => match args[0].parse::<ChatId>() {
                Ok(chat_id) => {
                    let message = args[1..].join(" ");
                    if message.len() > MAX_MESSAGE_LEN {
                        println!("[CLIENT] Message too long (max {} characters)", MAX_MESSAGE_LEN);
                        continue;
                    }
                    if let Ok(mut conversation) = session.conversation(chat_id).await {
                        if let Ok(id) = conversation.send(session.chat(), &message, MessageType::Text).await {
                            println!("[CLIENT] Sent (id {}).", id);
                        }
                    }
                }
                Err(e) => println!("[CLIENT] {}", e),
            },
            "/route" if args.len() == 1 => match navigator.navigate(args[0]) {
                Ok(resolved) => {
                    let resolved = resolved.clone();
                    println!("{} -> {} ({})", args[0], resolved.route.name, resolved.route.view);
                    for (key, value) in &resolved.params {
                        println!("  :{} = {}", key, value);
                    }
                    if resolved.route.meta.show_tabbar {
                        let tab = TABBAR[active_tab_index(resolved.route.name)];
                        println!("  tab: {} ({})", tab.label, tab.icon);
                    }
                    println!("  title: {}", navigator.document_title());
                }
                Err(e) => println!("[CLIENT] {}", e),
            },
            _ => println!("[CLIENT] Invalid command syntax. Type /help."),
        }

        for toast in toasts.drain() {
            println!("{} {}", toast.emoji(), toast.message);
        }
    }
    Ok(())
}

fn status_label(status: i32) -> &'static str {
    match status {
        0 => "pending",
        1 => "accepted",
        2 => "rejected",
        3 => "revoked",
        _ => "unknown",
    }
}
