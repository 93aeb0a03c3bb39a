//! JSON-lines sink for one-shot command-line searches.

use async_trait::async_trait;
use scour_search::{OutboundMessage, ResultSink, SearchEvent, SessionId};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Writes every event as one JSON line, in the same shape WebSocket
/// clients receive.
pub struct JsonLinesSink<W> {
    writer: Mutex<BufWriter<W>>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Flush buffered output.
    pub async fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().await.flush().await
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ResultSink for JsonLinesSink<W> {
    async fn deliver(&self, session: &SessionId, event: SearchEvent) {
        let json = match serde_json::to_string(&OutboundMessage::from(event)) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(%session, error = %e, "failed to serialize outbound message");
                return;
            }
        };
        let mut writer = self.writer.lock().await;
        if let Err(e) = write_line(&mut writer, &json).await {
            tracing::warn!(%session, error = %e, "failed to write outbound message");
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut BufWriter<W>,
    json: &str,
) -> std::io::Result<()> {
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use scour_search::ResultRecord;

    #[tokio::test]
    async fn writes_one_line_per_event() {
        let sink = JsonLinesSink::new(Vec::new());
        let session = SessionId::new("cli");
        sink.deliver(
            &session,
            SearchEvent::ResultFound(ResultRecord {
                source: "Site".into(),
                title: "Dune".into(),
                link: "https://site.test/dune".into(),
                poster: "https://site.test/dune.jpg".into(),
            }),
        )
        .await;
        sink.deliver(
            &session,
            SearchEvent::SourceFailed {
                source: "Other".into(),
                message: "Failed to fetch data from Other: HTTP status 500".into(),
            },
        )
        .await;

        let output = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["title"], "Dune");
        assert_eq!(lines[1]["error"], true);
        assert_eq!(lines[1]["source"], "Other");
    }
}
