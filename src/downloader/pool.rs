//! Bounded worker pool -- runs tasks with at most `concurrency` in flight and
//! publishes outcomes in completion order.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::FetchError;
use crate::types::{Outcome, Task};

use super::download_task::{DownloadTaskContext, run_download_task};

/// Outcomes of a run, yielded as tasks finish
pub type OutcomeStream = ReceiverStream<Outcome>;

/// Start up to `concurrency` workers draining a shared queue.
///
/// Tasks that write the same target path form one lane and run back to back
/// on a single worker, in input order, so a later one finds the earlier
/// file in place and is skipped instead of sharing its `.part` file. Each
/// task runs in its own spawned tokio task so a panic inside one download is
/// reported as a failed outcome instead of taking the worker down. The
/// returned stream ends once every task has produced its outcome. A
/// `concurrency` of 0 is treated as 1.
pub(crate) fn spawn_pool(
    ctx: Arc<DownloadTaskContext>,
    tasks: Vec<Task>,
    concurrency: usize,
) -> OutcomeStream {
    let lanes = lanes_by_target(tasks);
    let workers = concurrency.max(1).min(lanes.len());
    let (tx, rx) = mpsc::channel(workers.max(1) * 2);
    let queue = Arc::new(Mutex::new(lanes));

    tracing::debug!(workers, "Starting worker pool");

    for worker_id in 0..workers {
        let ctx = Arc::clone(&ctx);
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                // Hold the lock only long enough to take the next lane
                let Some(lane) = queue.lock().await.pop_front() else {
                    break;
                };

                for task in lane {
                    let outcome = run_isolated(Arc::clone(&ctx), task).await;
                    if tx.send(outcome).await.is_err() {
                        tracing::debug!(worker_id, "Outcome receiver dropped, worker exiting");
                        return;
                    }
                }
            }
        });
    }

    ReceiverStream::new(rx)
}

/// Group tasks by target path, lanes ordered by first appearance
fn lanes_by_target(tasks: Vec<Task>) -> VecDeque<Vec<Task>> {
    let mut lanes: VecDeque<Vec<Task>> = VecDeque::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for task in tasks {
        match index.get(task.target_path()) {
            Some(&lane) => lanes[lane].push(task),
            None => {
                index.insert(task.target_path().to_path_buf(), lanes.len());
                lanes.push_back(vec![task]);
            }
        }
    }
    lanes
}

/// Run one task on its own tokio task, mapping a panic to [`FetchError::Aborted`]
async fn run_isolated(ctx: Arc<DownloadTaskContext>, task: Task) -> Outcome {
    let identifier = task.identifier().to_string();
    let handle = tokio::spawn(async move { run_download_task(&ctx, &task).await });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(identifier = %identifier, error = %e, "Download task aborted");
            Outcome::failed(identifier, FetchError::Aborted(e.to_string()))
        }
    }
}
