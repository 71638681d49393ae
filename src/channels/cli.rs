//! CLI channel — stdin/stdout REPL for local use.
//!
//! Buttons are printed with their tags; `/pick <tag>` presses one. `/quit`
//! ends the stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

const CHANNEL_NAME: &str = "cli";
const USER_ID: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel {
    /// Generation of the last buttons shown, stamped on `/pick`.
    generation: Arc<AtomicU64>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Turn one input line into a message. `None` for blank lines.
fn parse_line(line: &str, generation: u64) -> Option<IncomingMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.strip_prefix("/pick ") {
        Some(tag) => Some(IncomingMessage::choice(
            CHANNEL_NAME,
            USER_ID,
            tag.trim(),
            Some(generation),
        )),
        None => Some(IncomingMessage::new(CHANNEL_NAME, USER_ID, line)),
    }
}

fn format_response(response: &OutgoingResponse) -> String {
    let mut out = response.content.clone();
    for choice in &response.choices {
        out.push_str(&format!("\n  • {}  (/pick {})", choice.label, choice.tag));
    }
    if let Some(path) = &response.attachment {
        out.push_str(&format!("\n📎 {}", path.display()));
    }
    out
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let generation = Arc::clone(&self.generation);

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if matches!(line.trim(), "/quit" | "/exit") {
                            break;
                        }
                        let Some(msg) = parse_line(&line, generation.load(Ordering::SeqCst)) else {
                            eprint!("> ");
                            continue;
                        };
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.generation.store(response.generation, Ordering::SeqCst);
        let text = format!("\n{}\n\n", format_response(&response));
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(text.as_bytes())
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL_NAME.to_string(),
                reason: e.to_string(),
            })?;
        stdout.flush().await.map_err(|e| ChannelError::SendFailed {
            name: CHANNEL_NAME.to_string(),
            reason: e.to_string(),
        })
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{MessageContent, ResponseChoice};

    #[test]
    fn pick_becomes_stamped_choice() {
        let msg = parse_line("/pick doc_egrn", 4).unwrap();
        assert_eq!(
            msg.content,
            MessageContent::Choice {
                tag: "doc_egrn".into(),
                generation: Some(4)
            }
        );
        assert_eq!(msg.user_id, USER_ID);
    }

    #[test]
    fn plain_lines_are_text_and_blank_lines_dropped() {
        let msg = parse_line("  москва ", 0).unwrap();
        assert_eq!(
            msg.content,
            MessageContent::Text {
                text: "москва".into()
            }
        );
        assert!(parse_line("   ", 0).is_none());
    }

    #[test]
    fn response_lists_buttons_and_attachment() {
        let response = OutgoingResponse::text("Готово")
            .with_choices(vec![ResponseChoice {
                tag: "skip_comm".into(),
                label: "Пропустить".into(),
            }])
            .with_attachment("out/a.json".into());
        assert_eq!(
            format_response(&response),
            "Готово\n  • Пропустить  (/pick skip_comm)\n📎 out/a.json"
        );
    }

    #[tokio::test]
    async fn respond_tracks_generation() {
        let channel = CliChannel::new();
        let msg = IncomingMessage::new(CHANNEL_NAME, USER_ID, "x");
        let response = OutgoingResponse {
            generation: 7,
            ..OutgoingResponse::text("ok")
        };
        channel.respond(&msg, response).await.unwrap();
        assert_eq!(channel.generation.load(Ordering::SeqCst), 7);
    }
}
