//! A transport that reads messages from stdin and prints replies.

use async_trait::async_trait;
use ember::prelude::*;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

pub struct ConsoleTransport {
    tenant: Option<TenantId>,
    author: i64,
    stop: CancellationToken,
    stdout: tokio::sync::Mutex<tokio::io::Stdout>,
    reader: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ConsoleTransport {
    pub fn new(tenant: Option<TenantId>, author: i64) -> Self {
        Self {
            tenant,
            author,
            stop: CancellationToken::new(),
            stdout: tokio::sync::Mutex::new(tokio::io::stdout()),
            reader: Mutex::new(None),
        }
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        let mut out = self.stdout.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn open(&self, credential: &str, sink: EventSink) -> TransportResult<BotUser> {
        if credential.is_empty() {
            return Err(TransportError::ConnectionFailed("empty credential".into()));
        }

        let (tenant, author, stop) = (self.tenant, self.author, self.stop.clone());
        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) if !line.trim().is_empty() => {
                            sink(InboundEvent::new(tenant, 0, author, line));
                        }
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            info!("stdin closed");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read stdin");
                            break;
                        }
                    },
                }
            }
        });
        *self.reader.lock() = Some(task);

        Ok(BotUser {
            id: 0,
            username: "ember".to_string(),
            discriminator: "0".to_string(),
        })
    }

    async fn send(&self, _event: &InboundEvent, text: &str) -> TransportResult<()> {
        self.write_line(text).await
    }

    async fn set_presence(&self, presence: &RenderedPresence) -> TransportResult<()> {
        self.write_line(&format!("* {} {}", presence.kind, presence.name)).await
    }

    async fn close(&self) -> TransportResult<()> {
        self.stop.cancel();
        let task = self.reader.lock().take();
        if let Some(task) = task {
            task.abort();
        }
        Ok(())
    }
}
