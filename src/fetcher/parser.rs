//! Conversion of downloaded document bytes into plain text.

use crate::types::StageError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Interface implemented by binary-to-text document parsers.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Extract the plain text of `bytes`.
    async fn parse(&self, bytes: &[u8]) -> Result<String, StageError>;
}

/// PDF parser that streams the document through poppler's `pdftotext`.
#[derive(Debug, Clone)]
pub struct PdfToTextParser {
    binary: PathBuf,
    timeout: Duration,
}

impl PdfToTextParser {
    /// Use the given executable, killing it if it runs longer than `timeout`.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn run(&self, bytes: &[u8]) -> Result<String, StageError> {
        let mut child = Command::new(&self.binary)
            .args(["-layout", "-enc", "UTF-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                if error.kind() == std::io::ErrorKind::NotFound {
                    StageError::parse(format!(
                        "{} not found (install poppler-utils)",
                        self.binary.display()
                    ))
                } else {
                    StageError::parse(format!("failed to start pdftotext: {error}"))
                }
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StageError::parse("pdftotext stdin unavailable"))?;
        let feed = async move {
            stdin.write_all(bytes).await?;
            stdin.shutdown().await
        };

        // stdout is drained while stdin is still being written, so large documents cannot stall.
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|error| StageError::parse(format!("pdftotext failed: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::parse(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if let Err(error) = fed {
            return Err(StageError::parse(format!(
                "failed to stream document to pdftotext: {error}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DocumentParser for PdfToTextParser {
    async fn parse(&self, bytes: &[u8]) -> Result<String, StageError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(StageError::parse(format!(
                "payload of {} bytes is not a PDF document",
                bytes.len()
            )));
        }

        tokio::time::timeout(self.timeout, self.run(bytes))
            .await
            .map_err(|_| {
                StageError::parse(format!(
                    "pdftotext did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}
