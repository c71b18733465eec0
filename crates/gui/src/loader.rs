//! Background fetch and decode of the backdrop image.
//!
//! Requests run on a small tokio runtime owned by the loader. Results come
//! back over a channel tagged with the ticket they were requested for; the
//! app drains them once per frame and the session drops stale ones.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use blockmatch_lib::sync::ImageTicket;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("empty image url")]
    EmptyUrl,
}

/// Where the backdrop comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
}

impl ImageSource {
    /// Interpret `image_url`; relative paths are taken from `base_dir`.
    pub fn resolve(image_url: &str, base_dir: Option<&Path>) -> Result<Self, LoadError> {
        let trimmed = image_url.trim();
        if trimmed.is_empty() {
            return Err(LoadError::EmptyUrl);
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(Self::Url(trimmed.to_string()));
        }
        let path = Path::new(trimmed.strip_prefix("file://").unwrap_or(trimmed));
        match base_dir {
            Some(base) if path.is_relative() => Ok(Self::File(base.join(path))),
            _ => Ok(Self::File(path.to_path_buf())),
        }
    }
}

/// Decoded RGBA pixels, at most `max_side` on the longer side.
/// Geometry always uses the native size.
pub struct DecodedImage {
    pub native_width: u32,
    pub native_height: u32,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct LoadedImage {
    pub ticket: ImageTicket,
    pub result: Result<DecodedImage, LoadError>,
}

pub struct ImageLoader {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    tx: Sender<LoadedImage>,
    rx: Receiver<LoadedImage>,
}

impl ImageLoader {
    pub fn new() -> Result<Self, LoadError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("image-loader")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            client: reqwest::Client::new(),
            tx,
            rx,
        })
    }

    /// Start loading. `ctx` is woken when the result is ready.
    pub fn request(
        &self,
        ticket: ImageTicket,
        source: ImageSource,
        timeout: Duration,
        ctx: egui::Context,
    ) {
        tracing::info!(?source, generation = ticket.generation(), "loading image");
        let max_side = u32::try_from(ctx.input(|i| i.max_texture_side)).unwrap_or(u32::MAX);
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, fetch_and_decode(&client, source, max_side)).await {
                Ok(result) => result,
                Err(_) => Err(LoadError::Timeout(timeout)),
            };
            if let Err(err) = &result {
                tracing::warn!(generation = ticket.generation(), "image load failed: {err}");
            }
            // Receiver gone means the app is shutting down.
            let _ = tx.send(LoadedImage { ticket, result });
            ctx.request_repaint();
        });
    }

    /// Results that arrived since the last call
    pub fn poll(&self) -> Vec<LoadedImage> {
        self.rx.try_iter().collect()
    }
}

async fn fetch_and_decode(
    client: &reqwest::Client,
    source: ImageSource,
    max_side: u32,
) -> Result<DecodedImage, LoadError> {
    let bytes = match source {
        ImageSource::Url(url) => {
            let response = client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(LoadError::Status(response.status()));
            }
            response.bytes().await?.to_vec()
        }
        ImageSource::File(path) => tokio::fs::read(&path).await?,
    };

    tokio::task::spawn_blocking(move || decode(&bytes, max_side))
        .await
        .map_err(|err| LoadError::Decode(err.to_string()))?
}

fn decode(bytes: &[u8], max_side: u32) -> Result<DecodedImage, LoadError> {
    let mut rgba = image::load_from_memory(bytes)
        .map_err(|err| LoadError::Decode(err.to_string()))?
        .to_rgba8();
    let (native_width, native_height) = rgba.dimensions();
    if native_width == 0 || native_height == 0 {
        return Err(LoadError::Decode(format!(
            "degenerate image {native_width}x{native_height}"
        )));
    }

    let longest = native_width.max(native_height);
    if max_side > 0 && longest > max_side {
        let scale = f64::from(max_side) / f64::from(longest);
        let side = |n: u32| ((f64::from(n) * scale).round() as u32).clamp(1, max_side);
        let (width, height) = (side(native_width), side(native_height));
        tracing::debug!(native_width, native_height, width, height, "downscaling backdrop texture");
        rgba = image::imageops::resize(&rgba, width, height, image::imageops::FilterType::Triangle);
    }

    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        native_width,
        native_height,
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sources() {
        assert_eq!(
            ImageSource::resolve("https://cdn.example.org/heart.png", None).unwrap(),
            ImageSource::Url("https://cdn.example.org/heart.png".into())
        );
        assert_eq!(
            ImageSource::resolve("heart.png", Some(Path::new("/data/ex"))).unwrap(),
            ImageSource::File(PathBuf::from("/data/ex/heart.png"))
        );
        assert_eq!(
            ImageSource::resolve("/abs/heart.png", Some(Path::new("/data/ex"))).unwrap(),
            ImageSource::File(PathBuf::from("/abs/heart.png"))
        );
        assert!(matches!(ImageSource::resolve("  ", None), Err(LoadError::EmptyUrl)));
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode(&png(4, 3), 2048).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 3));
        assert_eq!((decoded.native_width, decoded.native_height), (4, 3));
        assert_eq!(decoded.rgba.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_decode_downscales_past_texture_limit() {
        let decoded = decode(&png(400, 100), 64).unwrap();
        assert_eq!((decoded.native_width, decoded.native_height), (400, 100));
        assert_eq!((decoded.width, decoded.height), (64, 16));
        assert_eq!(decoded.rgba.len(), 64 * 16 * 4);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(b"not an image", 2048), Err(LoadError::Decode(_))));
    }
}
