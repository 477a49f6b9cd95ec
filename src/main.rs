use std::io::{self, BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kba_client::{AskRequest, ClientConfig, KbClient};
use kba_types::{Citation, HistoryTurn, MessageRole, Scope};

/// How many prior question/answer pairs are sent with each ask. History
/// truncation is a caller-side policy, so it lives here rather than in the
/// transport client.
const DEFAULT_HISTORY_TURNS: usize = 8;

/// Interactive chat shell for the KB-Assist backend
///
/// Reads questions from stdin in a loop, forwards them to the backend and
/// renders the answer together with its supporting citations and follow-up
/// suggestions. Keeps a bounded rolling history and sticks to the backend
/// session once the backend has identified one.
///
/// # Environment Variables
/// - `KBA_API_BASE`: backend base endpoint (default: "http://127.0.0.1:8000")
/// - `KBA_HTTP_TIMEOUT_SECS`: per-request timeout in seconds (default: 30)
/// - `KBA_SCOPE`: question scope: internal, web or hybrid (default: "hybrid")
/// - `KBA_AGENT`: agent identifier (default: "default")
/// - `KBA_HISTORY_TURNS`: prior turn pairs sent per ask (default: 8)
///
/// # Returns
/// * `Ok(())` - when the user ends the session
/// * `Err(anyhow::Error)` - if startup configuration is invalid
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kba_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let scope: Scope = std::env::var("KBA_SCOPE")
        .unwrap_or_else(|_| "hybrid".into())
        .parse()
        .map_err(anyhow::Error::msg)?;
    let agent = std::env::var("KBA_AGENT").unwrap_or_else(|_| "default".into());
    let history_turns: usize = std::env::var("KBA_HISTORY_TURNS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_HISTORY_TURNS);

    tracing::info!("++ KB-Assist chat shell, backend {}", config.base_url);
    tracing::info!("++ scope {}, agent {}", scope, agent);

    let client = KbClient::new(config)?;

    let mut history: Vec<HistoryTurn> = Vec::new();
    let mut session_id: Option<String> = None;

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "/quit" || question == "/exit" {
            break;
        }

        let mut request = AskRequest::new(question, scope)
            .with_agent(agent.clone())
            .with_history(history.clone());
        if let Some(id) = &session_id {
            request = request.with_session(id.clone());
        }

        match client.ask_question(&request).await {
            Ok(response) => {
                println!("\n{}\n", response.answer);

                for source in &response.sources {
                    let citation = Citation::from(source.clone());
                    println!(
                        "  [{}] {} ({}) {}",
                        citation.id,
                        citation.title,
                        citation.access_level.as_str(),
                        citation.source
                    );
                }
                if !response.follow_up_questions.is_empty() {
                    println!("\n  You could also ask:");
                    for follow_up in &response.follow_up_questions {
                        println!("  - {follow_up}");
                    }
                }
                println!();

                if response.chat_session_id.is_some() {
                    session_id = response.chat_session_id;
                }

                history.push(HistoryTurn {
                    role: MessageRole::User,
                    content: question.to_owned(),
                });
                history.push(HistoryTurn {
                    role: MessageRole::Assistant,
                    content: response.answer,
                });
                if history.len() > history_turns * 2 {
                    history.drain(..history.len() - history_turns * 2);
                }
            }
            Err(error) => {
                tracing::error!("ask failed: {error}");
                println!("\nSorry, something went wrong talking to the knowledge base.\n");
            }
        }
    }

    Ok(())
}
