//! File-based offline mutation queue

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use binroute_domain::model::PendingMutation;
use binroute_domain::repository::MutationQueue;
use binroute_types::{Result, TransportError};

/// Queued mutations in enqueue order, stored as a JSON array
pub struct FileMutationQueue {
    queue_path: PathBuf,
    entries: RefCell<Vec<PendingMutation>>,
}

impl FileMutationQueue {
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let queue_path = store_dir.join("offline_queue.json");

        let entries = if queue_path.exists() {
            let file = File::open(&queue_path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            Vec::new()
        };

        Ok(Self {
            queue_path,
            entries: RefCell::new(entries),
        })
    }

    fn persist(&self, entries: &[PendingMutation]) -> Result<()> {
        let storage = |e: std::io::Error| TransportError::Storage(format!("offline queue: {}", e));
        let file = File::create(&self.queue_path).map_err(storage)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries).map_err(|e| storage(e.into()))?;
        writer.flush().map_err(storage)?;
        Ok(())
    }
}

impl MutationQueue for FileMutationQueue {
    fn enqueue(&self, mutation: PendingMutation) -> Result<()> {
        let mut next = self.entries.borrow().clone();
        next.push(mutation);
        self.persist(&next)?;
        *self.entries.borrow_mut() = next;
        Ok(())
    }

    fn pending(&self) -> Result<Vec<PendingMutation>> {
        Ok(self.entries.borrow().clone())
    }

    fn acknowledge(&self, count: usize) -> Result<()> {
        let mut next = self.entries.borrow().clone();
        next.drain(..count.min(next.len()));
        self.persist(&next)?;
        *self.entries.borrow_mut() = next;
        Ok(())
    }
}
