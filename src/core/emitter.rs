use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Where finished events go. Delivery guarantees belong to the implementation;
/// the collector publishes once and moves on.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: Value) -> Result<()>;

    async fn publish_batch(&self, events: Vec<Value>) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// Newline-delimited JSON over any async writer (stdout or an append-mode file).
pub struct JsonLinesSink {
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesSink {
    pub fn new(out: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(tokio::io::stdout()))
    }

    pub async fn append_to(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self::new(Box::new(file)))
    }

    async fn write_lines(&self, events: &[Value]) -> Result<()> {
        let mut buf = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }
        let mut out = self.out.lock().await;
        out.write_all(&buf).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventSink for JsonLinesSink {
    async fn publish(&self, event: Value) -> Result<()> {
        self.write_lines(std::slice::from_ref(&event)).await
    }

    async fn publish_batch(&self, events: Vec<Value>) -> Result<()> {
        self.write_lines(&events).await
    }
}
