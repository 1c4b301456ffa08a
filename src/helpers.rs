pub mod bootstrap;
pub mod logging;
pub mod signal_handler;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

/// Collapses the two error layers of an awaited task (join error, task error)
/// into a single [Result].
pub async fn flatten(handle: JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(err),
        Err(err) => Err(anyhow!(err)),
    }
}
