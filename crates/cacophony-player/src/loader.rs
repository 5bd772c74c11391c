//! Asset loading off the UI thread
//!
//! Each loader runs its blocking decode on a dedicated thread and reports
//! back through a tokio oneshot channel, so `Task::perform` never stalls the
//! event loop. Errors are flattened to strings for the message enum.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cacophony_core::compositor::{load_sprite, RgbaImage};
use cacophony_core::dataset::Dataset;
use tokio::sync::oneshot;

/// Run `job` on its own thread and await its result
async fn off_thread<T, F>(name: &str, job: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| format!("Failed to spawn {} thread: {}", name, e))?;

    rx.await
        .map_err(|_| format!("{} thread exited without a result", name))?
        .map_err(|e| format!("{:#}", e))
}

pub async fn load_dataset(path: PathBuf) -> Result<Arc<Dataset>, String> {
    off_thread("dataset-loader", move || {
        let dataset = Dataset::load(&path)
            .with_context(|| format!("Failed to load dataset {:?}", path))?;
        log::info!("Loaded {} clips from {:?}", dataset.len(), path);
        Ok(Arc::new(dataset))
    })
    .await
}

pub async fn load_sprites(path: PathBuf) -> Result<Arc<RgbaImage>, String> {
    off_thread("sprite-loader", move || {
        let sprite = load_sprite(&path)
            .with_context(|| format!("Failed to load sprite sheet {:?}", path))?;
        log::info!(
            "Loaded sprite sheet {:?} ({}x{})",
            path,
            sprite.width(),
            sprite.height()
        );
        Ok(Arc::new(sprite))
    })
    .await
}
