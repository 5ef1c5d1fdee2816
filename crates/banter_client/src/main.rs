use std::io::Write;

use banter_client::{ChatClient, MarkdownFormat, Result, Service};
use banter_domain::{Conversation, Role};
use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(name = "banter", about = "Console client for the banter chat gateway")]
struct Cli {
    /// Gateway base URL.
    #[arg(long, default_value = "http://localhost:5001")]
    url: String,

    /// Bearer credential; falls back to BANTER_TOKEN.
    #[arg(long)]
    token: Option<String>,
}

#[derive(Debug)]
enum ChatCommand {
    End,
    New,
    List,
    Open(usize),
    Message(String),
}

impl ChatCommand {
    fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        match trimmed {
            "" => None,
            "/end" => Some(ChatCommand::End),
            "/new" => Some(ChatCommand::New),
            "/chats" => Some(ChatCommand::List),
            cmd if cmd.starts_with("/open ") => match cmd["/open ".len()..].trim().parse() {
                Ok(index) => Some(ChatCommand::Open(index)),
                Err(_) => {
                    eprintln!("Usage: /open <number>");
                    None
                }
            },
            cmd if cmd.starts_with('/') => {
                eprintln!("Unknown command: {}", cmd);
                None
            }
            text => Some(ChatCommand::Message(text.to_string())),
        }
    }
}

fn title(conversation: &Conversation) -> String {
    conversation
        .messages
        .iter()
        .find(|message| message.role == Role::User)
        .map(|message| message.content.chars().take(48).collect::<String>())
        .unwrap_or_else(|| "(empty)".to_string())
}

fn render_history(markdown: &MarkdownFormat, conversation: &Conversation) {
    for message in &conversation.messages {
        match message.role {
            Role::User => println!("{} {}", "❯".blue().bold(), message.content),
            Role::Assistant => println!("{}", markdown.render(&message.content)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let token = cli
        .token
        .or_else(|| std::env::var("BANTER_TOKEN").ok())
        .expect("BANTER_TOKEN must be set");

    let markdown = MarkdownFormat::new();
    let mut client = ChatClient::new(Service::gateway(cli.url, token));

    client.load_conversations().await?;
    if client.state().current.is_none() {
        client.create_conversation().await?;
    }

    if let Some(conversation) = client.state().current_chat() {
        render_history(&markdown, conversation);
    }

    loop {
        let input = inquire::Text::new("")
            .with_help_message("Message banter (/new, /chats, /open <n>, /end)")
            .prompt();

        let Ok(input) = input else { break };
        let Some(command) = ChatCommand::parse(&input) else {
            continue;
        };

        match command {
            ChatCommand::End => break,
            ChatCommand::New => {
                client.create_conversation().await?;
                println!("{}", "Started a new conversation".green());
            }
            ChatCommand::List => {
                for (index, conversation) in client.state().chats.iter().enumerate() {
                    let marker = if Some(conversation.id) == client.state().current {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {:>2}  {}", marker, index, title(conversation));
                }
            }
            ChatCommand::Open(index) => {
                let id = client.state().chats.get(index).map(|chat| chat.id);
                match id {
                    Some(id) => {
                        client.select(id);
                        if let Some(conversation) = client.state().current_chat() {
                            render_history(&markdown, conversation);
                        }
                    }
                    None => eprintln!("No conversation at index {}", index),
                }
            }
            ChatCommand::Message(text) => {
                client
                    .send_message(&text, |fragment| {
                        print!("{}", fragment);
                        let _ = std::io::stdout().flush();
                    })
                    .await?;
                println!();
            }
        }
    }

    Ok(())
}
