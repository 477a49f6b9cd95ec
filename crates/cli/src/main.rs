use clap::{Parser, Subcommand};
use kba_client::{AskRequest, ClientConfig, KbClient, Probe, DEFAULT_WEB_RESULTS};
use kba_types::{Citation, Scope};

#[derive(Parser)]
#[command(name = "kba")]
#[command(about = "KB-Assist knowledge assistant CLI")]
struct Cli {
    /// Backend base endpoint (overrides KBA_API_BASE)
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the knowledge assistant a question
    Ask {
        /// The question to ask
        question: String,
        /// Document population to draw from: internal, web or hybrid
        #[arg(long, default_value = "hybrid")]
        scope: Scope,
        /// Agent identifier
        #[arg(long, default_value = "default")]
        agent: String,
        /// Only answer when source-backed
        #[arg(long)]
        strict_citations: bool,
        /// Continue an existing backend session
        #[arg(long)]
        session: Option<String>,
    },
    /// List previous conversations
    Sessions,
    /// Print the transcript of one session
    Transcript {
        /// Session id
        session_id: String,
    },
    /// Run a web search
    Search {
        /// Search query
        query: String,
        /// Number of results to request
        #[arg(long, default_value_t = DEFAULT_WEB_RESULTS)]
        num: usize,
    },
    /// Hit a backend diagnostic probe: llm, rag or serper
    Probe {
        /// Probe target
        target: Probe,
    },
}

/// Render a nullable backend timestamp for display. The backend sends naive
/// ISO timestamps; RFC 3339 with an offset is accepted too.
fn format_timestamp(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "-".to_owned();
    };

    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    value.to_owned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.base_url {
        Some(base_url) => ClientConfig::new(base_url),
        None => ClientConfig::from_env(),
    };
    let client = KbClient::new(config)?;

    match cli.command {
        Some(Commands::Ask {
            question,
            scope,
            agent,
            strict_citations,
            session,
        }) => {
            let mut request = AskRequest::new(question, scope)
                .with_agent(agent)
                .with_strict_citations(strict_citations);
            if let Some(session) = session {
                request = request.with_session(session);
            }

            let response = client.ask_question(&request).await?;
            println!("{}", response.answer);

            if !response.sources.is_empty() {
                println!("\nSources:");
                for source in response.sources {
                    let citation = Citation::from(source);
                    let location = if citation.section.is_empty() {
                        citation.source
                    } else {
                        format!("{} — {}", citation.source, citation.section)
                    };
                    println!(
                        "  [{}] {} ({}) {}",
                        citation.id,
                        citation.title,
                        citation.access_level.as_str(),
                        location
                    );
                }
            }

            if !response.follow_up_questions.is_empty() {
                println!("\nFollow-ups:");
                for follow_up in response.follow_up_questions {
                    println!("  - {follow_up}");
                }
            }

            if let Some(session_id) = response.chat_session_id {
                println!("\nSession: {session_id}");
            }
        }
        Some(Commands::Sessions) => {
            let sessions = client.list_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions found.");
            } else {
                for session in sessions {
                    println!(
                        "{}  {}  {}  {}",
                        session.id,
                        format_timestamp(session.updated_at.as_deref()),
                        session.title,
                        session.preview
                    );
                }
            }
        }
        Some(Commands::Transcript { session_id }) => {
            let messages = client.session_messages(&session_id).await?;
            if messages.is_empty() {
                println!("No messages in session {session_id}.");
            } else {
                for message in messages {
                    println!("{}: {}", message.role.as_str(), message.content);
                }
            }
        }
        Some(Commands::Search { query, num }) => {
            let results = client.web_search(&query, num).await?;
            if results.is_empty() {
                println!("No results.");
            } else {
                for result in results {
                    println!("{}\n  {}", result.title, result.link);
                    if let Some(snippet) = result.snippet {
                        println!("  {snippet}");
                    }
                }
            }
        }
        Some(Commands::Probe { target }) => {
            let body = client.probe(target).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        None => {
            println!("Use 'kba --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_compactly_or_fall_back() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(
            format_timestamp(Some("2026-08-20T10:30:00")),
            "2026-08-20 10:30"
        );
        assert_eq!(
            format_timestamp(Some("2026-08-20T10:30:00+00:00")),
            "2026-08-20 10:30"
        );
        assert_eq!(format_timestamp(Some("yesterday")), "yesterday");
    }
}
