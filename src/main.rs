use goose_client::cli::{parse_args, CliCommand, USAGE, VERSION};
use goose_client::client::{GooseClient, StreamUpdate};
use goose_client::config::ApiConfig;
use goose_client::models::{ChatRequest, Message, Role};
use goose_client::sse::SseEvent;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let command = parse_args(std::env::args());
    match command {
        CliCommand::Version => {
            println!("goose-client {}", VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(reason) => {
            eprintln!("Error: {}\n\n{}", reason, USAGE);
            std::process::exit(2);
        }
        CliCommand::Status | CliCommand::Chat { .. } => {}
    }

    color_eyre::install()?;
    init_logging();

    let config = ApiConfig::from_env();
    tracing::debug!(?config, "Loaded configuration");
    let client = GooseClient::from_config(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match command {
            CliCommand::Status => run_status(&client).await,
            CliCommand::Chat { prompt, session_id } => {
                run_chat(&client, prompt, session_id).await
            }
            _ => Ok(()),
        }
    })
}

async fn run_status(client: &GooseClient) -> Result<()> {
    let status = client.test_connection().await;
    if status.is_connected {
        println!(
            "Connected to {} ({} ms)",
            client.config().base_url,
            status.response_time_ms.unwrap_or_default()
        );
        Ok(())
    } else {
        Err(eyre!(
            "Cannot reach {}: {}",
            client.config().base_url,
            status.error.unwrap_or_else(|| "unknown error".to_string())
        ))
    }
}

async fn run_chat(client: &GooseClient, prompt: String, session_id: Option<String>) -> Result<()> {
    let mut request = ChatRequest::new(vec![Message::user(prompt)], &client.config().working_dir);
    if let Some(id) = session_id {
        request = request.with_session_id(id);
    }

    let (handle, mut updates) = client.stream(&request);
    let mut streamed_tokens = false;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    // Sender dropped without a terminal update
                    return Ok(());
                };
                match update {
                    StreamUpdate::Event(event) => {
                        render_event(&mut stdout, event, &mut streamed_tokens)?;
                    }
                    StreamUpdate::DecodeError(err) => {
                        tracing::warn!("Skipped malformed frame: {}", err);
                    }
                    StreamUpdate::Complete => {
                        writeln!(stdout)?;
                        return Ok(());
                    }
                    StreamUpdate::Error(err) => {
                        writeln!(stdout)?;
                        return Err(eyre!("{}", err.user_message()));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                eprintln!("\nCancelled");
                return Ok(());
            }
        }
    }
}

fn render_event(out: &mut impl Write, event: SseEvent, streamed_tokens: &mut bool) -> Result<()> {
    match event {
        SseEvent::Token { value } => {
            *streamed_tokens = true;
            write!(out, "{}", value)?;
            out.flush()?;
        }
        // Token streams already printed the text
        SseEvent::Message { message, .. } if message.role == Role::Assistant && !*streamed_tokens => {
            write!(out, "{}", message.text())?;
            out.flush()?;
        }
        SseEvent::Error { error } => {
            eprintln!("\nAgent error: {}", error);
        }
        SseEvent::ModelChange { model, mode } => {
            tracing::info!(%model, %mode, "Model changed");
        }
        SseEvent::Finish { reason, .. } => {
            tracing::debug!(reason = reason.as_deref().unwrap_or(""), "Reply finished");
        }
        other => {
            tracing::debug!(event = other.event_type_name(), "Ignoring event");
        }
    }
    Ok(())
}
