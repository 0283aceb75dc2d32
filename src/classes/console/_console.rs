use futures::future::join_all;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, instrument};

use crate::{
    base_libs::_operation::{Operation, OperationType},
    classes::coalescer::_write_coalescer::WriteCoalescer,
    config::_pending_write::WriteHandle,
};

/// Line-oriented front end over a coalescer, one response line per command.
pub struct Console {
    coalescer: WriteCoalescer,
    outstanding: Vec<WriteHandle>,
    // Failures already pruned from `outstanding`, not yet reported by WAIT
    unreported_failures: usize,
}

impl Console {
    pub fn new(coalescer: WriteCoalescer) -> Self {
        Console {
            coalescer,
            outstanding: Vec::new(),
            unreported_failures: 0,
        }
    }

    pub fn coalescer(&self) -> &WriteCoalescer {
        &self.coalescer
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn process_request(&mut self, request: &Operation) -> String {
        match request.op_type {
            OperationType::GET => match self.coalescer.get_raw(&request.key) {
                Ok(Some(value)) => value,
                Ok(None) => "(nil)".to_string(),
                Err(e) => format!("ERR {}", e),
            },
            OperationType::SET => match serde_json::from_str::<serde_json::Value>(&request.value) {
                Ok(value) => {
                    let handle = self.coalescer.set(&request.key, value);
                    self.track(handle);
                    format!("QUEUED {}", request.key)
                }
                Err(e) => format!("ERR invalid json: {}", e),
            },
            OperationType::DELETE => {
                let handle = self.coalescer.remove_when_idle(&request.key);
                self.track(handle);
                format!("QUEUED {}", request.key)
            }
            OperationType::REMOVE => match self.coalescer.remove(&request.key) {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("ERR {}", e),
            },
            OperationType::COMMIT => {
                let report = self.coalescer.commit();
                format!(
                    "COMMITTED w={} r={} f={}",
                    report.written,
                    report.removed,
                    report.failed + report.remove_errors.len()
                )
            }
            OperationType::CLEAR => match self.coalescer.clear() {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("ERR {}", e),
            },
            OperationType::PENDING => self.coalescer.has_pending().to_string(),
            OperationType::STATS => match serde_json::to_string(&self.coalescer.stats()) {
                Ok(stats) => stats,
                Err(e) => format!("ERR {}", e),
            },
            OperationType::WAIT => self.wait().await,
            OperationType::BAD => format!("ERR {}", request.value),
        }
    }

    /// Keeps `handle` for the next WAIT, dropping handles that already settled.
    fn track(&mut self, handle: WriteHandle) {
        let mut failures = 0;
        self.outstanding.retain(|pending| match pending.try_result() {
            None => true,
            Some(Ok(())) => false,
            Some(Err(_)) => {
                failures += 1;
                false
            }
        });
        self.unreported_failures += failures;
        self.outstanding.push(handle);
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    async fn wait(&mut self) -> String {
        let results = join_all(self.outstanding.drain(..)).await;
        let failed = results.iter().filter(|result| result.is_err()).count()
            + std::mem::take(&mut self.unreported_failures);

        if failed == 0 {
            "OK".to_string()
        } else {
            format!("ERR {} writes failed", failed)
        }
    }

    /// Serves commands until `reader` runs dry, then commits what is left.
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let request = Operation::from_string(&line);
            let response = self.process_request(&request).await;
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        let report = self.coalescer.commit();
        info!("[EXIT] Committed {} pending writes on shutdown", report.total());
        Ok(())
    }
}
