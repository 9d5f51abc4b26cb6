use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

/// Path that opens a private in-memory database instead of a file.
pub const IN_MEMORY: &str = ":memory:";

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the job queue and the thread draining it. Closing the queue ends the
/// thread's loop, so dropping the last `Database` handle joins the worker.
struct Worker {
    jobs: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Reading store worker panicked");
            }
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    if path.as_os_str() == IN_MEMORY {
        return Connection::open_in_memory().context("failed to open in-memory database");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("Reading store stays in rollback-journal mode: {err}");
    }
    Ok(conn)
}

/// SQLite-backed reading store. All statements run on one worker thread
/// that owns the connection; callers hand it closures through `execute`.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl Database {
    pub fn new(path: PathBuf) -> Result<Self> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let (opened_tx, opened_rx) = mpsc::sync_channel::<Result<()>>(1);
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("presence-db".into())
            .spawn(move || {
                let mut conn = match open_connection(&thread_path)
                    .and_then(|mut conn| run_migrations(&mut conn).map(|()| conn))
                {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = opened_tx.send(Err(err));
                        return;
                    }
                };
                if opened_tx.send(Ok(())).is_err() {
                    return;
                }

                for job in queue {
                    job(&mut conn);
                }
            })
            .context("failed to spawn database worker thread")?;

        let worker = Worker {
            jobs: Some(jobs),
            thread: Some(thread),
        };
        opened_rx
            .recv()
            .map_err(|_| anyhow!("database worker exited during startup"))??;

        info!("Reading store ready at {}", path.display());
        Ok(Self {
            worker: Arc::new(worker),
            path: Arc::new(path),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(PathBuf::from(IN_MEMORY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `task` against the connection on the worker thread.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let jobs = self
            .worker
            .jobs
            .as_ref()
            .ok_or_else(|| anyhow!("reading store is shut down"))?;
        let (reply_tx, reply_rx) = oneshot::channel();

        jobs.send(Box::new(move |conn| {
            // Receiver gone means the caller was cancelled; nothing to report.
            let _ = reply_tx.send(task(conn));
        }))
        .map_err(|_| anyhow!("reading store worker is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("reading store worker stopped before replying"))?
    }
}
