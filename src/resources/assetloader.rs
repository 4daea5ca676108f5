//! Background image loader.
//!
//! Reading files from disk happens on a helper thread; turning bytes into a
//! texture must happen on the main thread because it talks to the GPU. The
//! loader therefore only moves bytes:
//!
//! - [`AssetLoader::request`] sends a [`LoadRequest`] to the thread
//! - the thread answers with a [`LoadedAsset`] holding the bytes or the error
//! - [`AssetLoader::drain`] collects finished loads without blocking
//!
//! Every request carries the scene generation that asked for it. A scene that
//! was destroyed in the meantime has a newer generation, so its stale results
//! can be recognised and dropped.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: String,
    pub path: PathBuf,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum LoaderCmd {
    Load(LoadRequest),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub key: String,
    pub path: PathBuf,
    pub generation: u64,
    pub bytes: Result<Vec<u8>, String>,
}

impl LoadedAsset {
    /// File extension including the dot, as raylib expects it.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
            .unwrap_or_else(|| ".png".to_string())
    }
}

/// Bridge between the ECS world and the loader thread.
#[derive(Resource)]
pub struct AssetLoader {
    tx_cmd: Sender<LoaderCmd>,
    rx_loaded: Receiver<LoadedAsset>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl AssetLoader {
    /// Spawn the loader thread.
    pub fn spawn() -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
        let (tx_loaded, rx_loaded) = unbounded::<LoadedAsset>();
        let handle = std::thread::spawn(move || loader_thread(rx_cmd, tx_loaded));
        Self {
            tx_cmd,
            rx_loaded,
            handle: Some(handle),
        }
    }

    /// A loader without a thread, fed by hand. Used by tests.
    pub fn detached() -> (Self, Receiver<LoaderCmd>, Sender<LoadedAsset>) {
        let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
        let (tx_loaded, rx_loaded) = unbounded::<LoadedAsset>();
        let loader = Self {
            tx_cmd,
            rx_loaded,
            handle: None,
        };
        (loader, rx_cmd, tx_loaded)
    }

    /// Queue a file. Returns `false` if the thread is gone.
    pub fn request(
        &self,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        generation: u64,
    ) -> bool {
        let req = LoadRequest {
            key: key.into(),
            path: path.into(),
            generation,
        };
        debug!("requesting '{}' from {:?} (generation {})", req.key, req.path, generation);
        self.tx_cmd.send(LoaderCmd::Load(req)).is_ok()
    }

    /// Finished loads, without blocking.
    pub fn drain(&self) -> Vec<LoadedAsset> {
        self.rx_loaded.try_iter().collect()
    }

    /// Ask the thread to stop and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.tx_cmd.send(LoaderCmd::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove the loader from the world and join its thread.
pub fn shutdown_asset_loader(world: &mut World) {
    if let Some(loader) = world.remove_resource::<AssetLoader>() {
        loader.shutdown();
    }
}

fn loader_thread(rx_cmd: Receiver<LoaderCmd>, tx_loaded: Sender<LoadedAsset>) {
    for cmd in rx_cmd.iter() {
        match cmd {
            LoaderCmd::Load(req) => {
                let bytes = std::fs::read(&req.path)
                    .map_err(|e| format!("{}: {}", req.path.display(), e));
                let loaded = LoadedAsset {
                    key: req.key,
                    path: req.path,
                    generation: req.generation,
                    bytes,
                };
                if tx_loaded.send(loaded).is_err() {
                    break;
                }
            }
            LoaderCmd::Shutdown => break,
        }
    }
    info!("asset loader thread finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for(loader: &AssetLoader, n: usize) -> Vec<LoadedAsset> {
        let mut out = Vec::new();
        for _ in 0..200 {
            out.extend(loader.drain());
            if out.len() >= n {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        out
    }

    #[test]
    fn reads_files_and_reports_missing_ones() {
        let path = std::env::temp_dir()
            .join(format!("wizardwatch-loader-{}.png", std::process::id()));
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let loader = AssetLoader::spawn();
        assert!(loader.request("bg", &path, 3));
        assert!(loader.request("sheet", "/definitely/not/here.png", 3));
        let mut loaded = wait_for(&loader, 2);
        loader.shutdown();
        std::fs::remove_file(&path).ok();

        loaded.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].key, "bg");
        assert_eq!(loaded[0].generation, 3);
        assert_eq!(loaded[0].bytes.as_deref().unwrap(), &[1, 2, 3]);
        assert_eq!(loaded[0].extension(), ".png");
        assert!(loaded[1].bytes.is_err());
    }

    #[test]
    fn detached_loader_forwards_requests() {
        let (loader, rx_cmd, _tx) = AssetLoader::detached();
        loader.request("bg", "a/b.PNG", 1);
        match rx_cmd.try_recv().unwrap() {
            LoaderCmd::Load(req) => assert_eq!(req.path, PathBuf::from("a/b.PNG")),
            LoaderCmd::Shutdown => panic!("unexpected shutdown"),
        }
    }
}
