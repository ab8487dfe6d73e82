use egui::{Color32, ColorImage, TextureHandle};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use super::sources::{TileCoord, TileSource};

/// Rendered tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;
const CACHE_DURATION_DAYS: u64 = 7;

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

/// One drawable tile layer: a source, its texture/disk caches, and the tint
/// it is painted with (the radar overlay uses a translucent tint).
pub struct TileLayer {
    source: Box<dyn TileSource>,
    tint: Color32,
    cache_dir: PathBuf,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    download_queue: Arc<Mutex<Vec<TileCoord>>>,
}

impl TileLayer {
    /// Fully opaque layer (base map).
    pub fn new(source: Box<dyn TileSource>) -> Self {
        Self::with_opacity(source, 1.0)
    }

    /// Layer painted at `opacity` (0.0 - 1.0); used for the radar overlay.
    pub fn with_opacity(source: Box<dyn TileSource>, opacity: f32) -> Self {
        let cache_dir = Self::cache_dir_for(source.name());

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            log::warn!("Failed to create tile cache directory: {}", e);
        }

        Self::cleanup_old_tiles(&cache_dir);

        let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
        Self {
            source,
            tint: Color32::from_white_alpha(alpha),
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tint(&self) -> Color32 {
        self.tint
    }

    pub fn attribution(&self) -> &'static str {
        self.source.attribution()
    }

    pub fn max_zoom(&self) -> u8 {
        self.source.max_zoom()
    }

    fn cache_dir_for(source_name: &str) -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("stormwatch-desktop");
        path.push("tiles");
        path.push(source_name);
        path
    }

    fn cleanup_old_tiles(cache_dir: &PathBuf) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        if let Ok(entries) = fs::read_dir(cache_dir) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if let Ok(modified) = metadata.modified() {
                        if let Ok(age) = now.duration_since(modified) {
                            if age > max_age {
                                let _ = fs::remove_file(entry.path());
                                log::debug!("Removed old tile cache: {:?}", entry.path());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Cache filename based on hash of the tile URL
    fn cache_filename(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = hasher.finalize();
        format!("{:x}", hash)
    }

    /// Get tile from cache or queue for download
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = match self.tiles.lock() {
            Ok(tiles) => tiles,
            Err(_) => return None,
        };

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading) => None,
            Some(TileState::Failed) => None,
            None => {
                let url = self.source.tile_url(coord);
                let cache_path = self
                    .cache_dir
                    .join(format!("{}.png", Self::cache_filename(&url)));

                if cache_path.exists() {
                    match load_tile_from_disk(&cache_path, ctx, coord) {
                        Ok(texture) => {
                            tiles.insert(coord, TileState::Loaded(texture.clone()));
                            Some(texture)
                        }
                        Err(e) => {
                            log::warn!("Failed to load cached tile: {}", e);
                            tiles.insert(coord, TileState::Loading);
                            self.queue_download(coord, url, ctx.clone());
                            None
                        }
                    }
                } else {
                    tiles.insert(coord, TileState::Loading);
                    self.queue_download(coord, url, ctx.clone());
                    None
                }
            }
        }
    }

    fn queue_download(&self, coord: TileCoord, url: String, ctx: egui::Context) {
        let mut queue = match self.download_queue.lock() {
            Ok(queue) => queue,
            Err(_) => return,
        };
        if !queue.contains(&coord) {
            queue.push(coord);

            let tiles = self.tiles.clone();
            let cache_dir = self.cache_dir.clone();

            std::thread::spawn(move || {
                download_tile(coord, url, tiles, cache_dir, ctx);
            });
        }
    }

    pub fn has_loading_tiles(&self) -> bool {
        self.tiles
            .lock()
            .map(|tiles| tiles.values().any(|state| matches!(state, TileState::Loading)))
            .unwrap_or(false)
    }

    pub fn error_count(&self) -> usize {
        self.tiles
            .lock()
            .map(|tiles| {
                tiles
                    .values()
                    .filter(|state| matches!(state, TileState::Failed))
                    .count()
            })
            .unwrap_or(0)
    }
}

fn load_tile_from_disk(
    path: &PathBuf,
    ctx: &egui::Context,
    coord: TileCoord,
) -> Result<TextureHandle, String> {
    let img_data = fs::read(path).map_err(|e| e.to_string())?;
    decode_tile(&img_data, ctx, coord)
}

fn decode_tile(bytes: &[u8], ctx: &egui::Context, coord: TileCoord) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];

    let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}/{}", coord.zoom, coord.x, coord.y),
        color_image,
        Default::default(),
    ))
}

fn download_tile(
    coord: TileCoord,
    url: String,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    cache_dir: PathBuf,
    ctx: egui::Context,
) {
    log::debug!("Downloading tile: {}", url);

    let mark = |state: TileState| {
        if let Ok(mut tiles_lock) = tiles.lock() {
            tiles_lock.insert(coord, state);
        }
    };

    match reqwest::blocking::get(&url) {
        Ok(response) => {
            if response.status().is_success() {
                match response.bytes() {
                    Ok(bytes) => {
                        let cache_path =
                            cache_dir.join(format!("{}.png", TileLayer::cache_filename(&url)));
                        if let Err(e) = fs::write(&cache_path, &bytes) {
                            log::warn!("Failed to save tile to cache: {}", e);
                        }

                        match decode_tile(&bytes, &ctx, coord) {
                            Ok(texture) => {
                                mark(TileState::Loaded(texture));
                                ctx.request_repaint();
                            }
                            Err(e) => {
                                log::warn!("Failed to decode tile image: {}", e);
                                mark(TileState::Failed);
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read tile bytes: {}", e);
                        mark(TileState::Failed);
                    }
                }
            } else {
                log::warn!("Failed to download tile: HTTP {}", response.status());
                mark(TileState::Failed);
            }
        }
        Err(e) => {
            log::warn!("Failed to fetch tile: {}", e);
            mark(TileState::Failed);
        }
    }
}
