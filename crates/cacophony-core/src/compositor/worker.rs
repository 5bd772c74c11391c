//! Background grid rebuilds
//!
//! Compositing the full grid touches ~21M pixels, far too slow for the UI
//! thread. The worker owns the dataset and sprite sheet and rebuilds on
//! request:
//!
//! 1. The engine issues a [`RebuildRequest`] tagged with a generation number
//! 2. The worker thread drops queued requests superseded by newer ones
//! 3. The host polls [`CompositorWorker::try_recv`] from its tick handler and
//!    hands results to the engine, which ignores stale generations

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::RgbaImage;

use super::{composite_grid, CompositedGrid};
use crate::dataset::Dataset;
use crate::filter::FilterSet;
use crate::palette::ColorMode;

/// Snapshot of the inputs for one rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildRequest {
    pub generation: u64,
    pub filters: FilterSet,
    pub mode: ColorMode,
}

/// Background thread rebuilding the composited grid
pub struct CompositorWorker {
    tx: Sender<RebuildRequest>,
    rx: Receiver<CompositedGrid>,
    _handle: JoinHandle<()>,
}

impl CompositorWorker {
    /// Spawn the worker thread
    pub fn spawn(dataset: Arc<Dataset>, sprite: Option<Arc<RgbaImage>>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<RebuildRequest>();
        let (result_tx, result_rx) = std::sync::mpsc::channel::<CompositedGrid>();

        let handle = thread::Builder::new()
            .name("grid-compositor".to_string())
            .spawn(move || compositor_thread(dataset, sprite, request_rx, result_tx))?;

        log::info!("Compositor background thread started");

        Ok(Self {
            tx: request_tx,
            rx: result_rx,
            _handle: handle,
        })
    }

    /// Queue a rebuild (non-blocking)
    pub fn request(&self, request: RebuildRequest) -> Result<(), String> {
        self.tx
            .send(request)
            .map_err(|e| format!("Compositor thread disconnected: {}", e))
    }

    /// Next finished grid, if any
    pub fn try_recv(&self) -> Option<CompositedGrid> {
        match self.rx.try_recv() {
            Ok(grid) => Some(grid),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Compositor thread disconnected unexpectedly");
                None
            }
        }
    }

    /// Drain every finished grid and keep the newest
    pub fn latest(&self) -> Option<CompositedGrid> {
        let mut latest: Option<CompositedGrid> = None;
        while let Some(grid) = self.try_recv() {
            if latest.as_ref().map_or(true, |l| grid.generation > l.generation) {
                latest = Some(grid);
            }
        }
        latest
    }
}

fn compositor_thread(
    dataset: Arc<Dataset>,
    sprite: Option<Arc<RgbaImage>>,
    rx: Receiver<RebuildRequest>,
    tx: Sender<CompositedGrid>,
) {
    log::debug!("Compositor thread starting");

    while let Ok(mut request) = rx.recv() {
        // Skip to the newest queued request
        while let Ok(newer) = rx.try_recv() {
            request = newer;
        }

        let image = composite_grid(&dataset, sprite.as_deref(), &request.filters, request.mode);
        let grid = CompositedGrid {
            image: Arc::new(image),
            generation: request.generation,
        };

        if tx.send(grid).is_err() {
            break;
        }
    }

    log::debug!("Compositor thread shutting down");
}
