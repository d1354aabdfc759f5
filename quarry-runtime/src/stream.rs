//! Row streaming.
//!
//! A [`RowStream`] is a lazy, finite, non-restartable sequence of rows fed
//! by a background task through a bounded channel; the channel capacity is
//! the back-pressure window. Dropping the stream cancels the feeder.

use crate::adapter::Row;
use quarry_core::QuarryResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct RowStream {
    rx: mpsc::Receiver<QuarryResult<Row>>,
    handle: JoinHandle<()>,
}

impl RowStream {
    pub(crate) fn new(rx: mpsc::Receiver<QuarryResult<Row>>, handle: JoinHandle<()>) -> Self {
        Self { rx, handle }
    }

    /// Next row, or `None` when the stream is exhausted.
    pub async fn next(&mut self) -> Option<QuarryResult<Row>> {
        self.rx.recv().await
    }

    /// Drain the remaining rows, stopping at the first error.
    pub async fn collect(mut self) -> QuarryResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(item) = self.next().await {
            rows.push(item?);
        }
        Ok(rows)
    }

    /// Stop accepting rows; the feeder observes the closed sink and ends.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
