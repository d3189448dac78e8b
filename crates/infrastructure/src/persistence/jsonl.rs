use async_trait::async_trait;
use chrono::{DateTime, Utc};
use palisade_dns_application::ports::{Conversation, ConversationWriter};
use palisade_dns_domain::{rcode_name, DomainError};
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON record per conversation to a log file.
///
/// This backend is write-only: the serialized projection cannot rebuild the
/// wire messages a reader would need.
pub struct JsonlConversationWriter {
    file: Mutex<tokio::fs::File>,
}

#[derive(Serialize)]
struct ConversationRecord<'a> {
    time: DateTime<Utc>,
    client: String,
    name: String,
    class: String,
    qtype: String,
    rcode: &'static str,
    answers: Vec<String>,
    mark: i64,
    labels: Vec<&'a str>,
    served_by: Option<&'a str>,
    handler: Option<&'a str>,
    comment: Option<&'a str>,
}

impl JsonlConversationWriter {
    pub async fn open(path: &Path) -> Result<Self, DomainError> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| DomainError::Persistence(format!("open {}: {e}", path.display())))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl ConversationWriter for JsonlConversationWriter {
    async fn write(&self, conversation: Conversation) -> Result<(), DomainError> {
        let record = ConversationRecord {
            time: conversation.time,
            client: conversation.request.remote_addr().to_string(),
            name: conversation.request.name().to_string(),
            class: conversation.request.query_class().to_string(),
            qtype: conversation.request.query_type().to_string(),
            rcode: rcode_name(conversation.response.message().response_code()),
            answers: conversation
                .response
                .message()
                .answers()
                .iter()
                .map(|record| record.to_string())
                .collect(),
            mark: conversation.request.mark(),
            labels: conversation.request.labels().collect(),
            served_by: conversation.response.served_by(),
            handler: conversation.response.handler(),
            comment: conversation.response.comment(),
        };

        let mut line =
            serde_json::to_vec(&record).map_err(|e| DomainError::Persistence(e.to_string()))?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(())
    }
}
