//! In-process background worker pool.
//!
//! Handlers enqueue jobs and return immediately; a distributor task
//! hands jobs to workers round-robin and each worker processes its
//! jobs one at a time, so at most `worker_count` jobs run at once.
//! Jobs outlive the requests that queued them and failures are
//! logged, not retried. The pool also owns the hourly sweep of
//! expired entries from the token revocation ledger.

pub mod export;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{MediaConfig, WorkerConfig};
use crate::error::AppError;
use crate::services::database::Database;
use crate::services::verification::SmsSender;

#[derive(Debug, Clone)]
pub enum Job {
    /// Build the person directory archive under the media root.
    ExportPersons,
    SendSms {
        phone_number: String,
        message: String,
    },
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::ExportPersons => "export_persons",
            Job::SendSms { .. } => "send_sms",
        }
    }
}

/// Cloneable handle for enqueueing jobs from handlers.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    pub fn enqueue(&self, job: Job) -> Result<(), AppError> {
        self.tx
            .try_send(job)
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Job queue full")))
    }
}

pub struct WorkerPool {
    config: WorkerConfig,
    db: Database,
    sms: Arc<dyn SmsSender>,
    media: MediaConfig,
    job_rx: Option<mpsc::Receiver<Job>>,
    shutdown_token: CancellationToken,
}

impl WorkerPool {
    pub fn new(
        config: WorkerConfig,
        db: Database,
        sms: Arc<dyn SmsSender>,
        media: MediaConfig,
    ) -> (Self, JobQueue) {
        let (tx, job_rx) = mpsc::channel(config.queue_size);

        let pool = Self {
            config,
            db,
            sms,
            media,
            job_rx: Some(job_rx),
            shutdown_token: CancellationToken::new(),
        };

        (pool, JobQueue { tx })
    }

    pub fn start(mut self) -> CancellationToken {
        let mut job_rx = match self.job_rx.take() {
            Some(rx) => rx,
            None => return self.shutdown_token.clone(),
        };

        tracing::info!(
            worker_count = self.config.worker_count,
            queue_size = self.config.queue_size,
            "Starting worker pool"
        );

        let worker_count = self.config.worker_count.max(1);
        let per_worker = (self.config.queue_size / worker_count).max(1);

        let mut worker_txs = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let (worker_tx, mut worker_rx) = mpsc::channel::<Job>(per_worker);
            worker_txs.push(worker_tx);

            let worker = Worker {
                id: worker_id,
                db: self.db.clone(),
                sms: self.sms.clone(),
                media: self.media.clone(),
            };
            let shutdown = self.shutdown_token.clone();

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::info!(worker_id = worker.id, "Worker shutting down");
                            break;
                        }
                        job = worker_rx.recv() => {
                            match job {
                                // Inline so a worker runs one job at a time
                                Some(job) => worker.process_job(job).await,
                                None => break,
                            }
                        }
                    }
                }
            });
        }

        let shutdown = self.shutdown_token.clone();
        tokio::spawn(async move {
            let mut next_worker = 0;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Job distributor shutting down");
                        break;
                    }
                    job = job_rx.recv() => {
                        match job {
                            Some(job) => {
                                tracing::info!(
                                    worker_id = next_worker,
                                    job = job.name(),
                                    "Dispatching job to worker"
                                );
                                if worker_txs[next_worker].send(job).await.is_err() {
                                    tracing::error!(worker_id = next_worker, "Worker channel closed");
                                }
                                next_worker = (next_worker + 1) % worker_txs.len();
                            }
                            None => {
                                tracing::info!("Channel closed, job distributor exiting");
                                break;
                            }
                        }
                    }
                }
            }
        });

        self.spawn_token_sweep();

        self.shutdown_token.clone()
    }

    /// Hourly deletion of expired rows from the revocation ledger.
    fn spawn_token_sweep(&self) {
        let db = self.db.clone();
        let shutdown = self.shutdown_token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(3600));
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Token sweep shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match db.purge_expired_tokens().await {
                            Ok(purged) if purged > 0 => {
                                tracing::info!(purged, "Purged expired blacklisted tokens");
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::error!(error = %e, "Token sweep failed");
                            }
                        }
                    }
                }
            }
        });
    }
}

#[derive(Clone)]
struct Worker {
    id: usize,
    db: Database,
    sms: Arc<dyn SmsSender>,
    media: MediaConfig,
}

impl Worker {
    async fn process_job(&self, job: Job) {
        let name = job.name();
        let start = std::time::Instant::now();

        let result = match job {
            Job::ExportPersons => export::run(&self.db, &self.media).await,
            Job::SendSms {
                phone_number,
                message,
            } => self
                .sms
                .send(&phone_number, &message)
                .await
                .map_err(AppError::InternalError),
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    worker_id = self.id,
                    job = name,
                    duration_ms = start.elapsed().as_millis(),
                    "Job succeeded"
                );
            }
            Err(e) => {
                tracing::error!(
                    worker_id = self.id,
                    job = name,
                    error = %e,
                    "Job failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::verification::MockSmsSender;
    use sqlx::postgres::PgPool;

    fn test_pool() -> Database {
        Database::new(PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    fn test_media() -> MediaConfig {
        MediaConfig {
            root: std::env::temp_dir().display().to_string(),
            upload_max_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn test_single_worker_drains_queue_in_order() {
        let sms = Arc::new(MockSmsSender::default());
        let config = WorkerConfig {
            worker_count: 1,
            queue_size: 16,
        };
        let (pool, queue) = WorkerPool::new(config, test_pool(), sms.clone(), test_media());

        for i in 0..3 {
            queue
                .enqueue(Job::SendSms {
                    phone_number: format!("99899000000{}", i),
                    message: "hello".to_string(),
                })
                .unwrap();
        }

        let token = pool.start();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        token.cancel();

        let sent = sms.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        // One worker processes inline, so order is preserved
        assert_eq!(sent[0].0, "998990000000");
        assert_eq!(sent[2].0, "998990000002");
    }

    #[tokio::test]
    async fn test_enqueue_fails_when_queue_full() {
        let sms = Arc::new(MockSmsSender::default());
        let config = WorkerConfig {
            worker_count: 1,
            queue_size: 1,
        };
        // Pool never started, so the queue cannot drain
        let (_pool, queue) = WorkerPool::new(config, test_pool(), sms, test_media());

        let job = Job::SendSms {
            phone_number: "998991234567".to_string(),
            message: "hello".to_string(),
        };
        assert!(queue.enqueue(job.clone()).is_ok());
        assert!(queue.enqueue(job).is_err());
    }
}
