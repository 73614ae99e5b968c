use egui::{ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::poller::Notify;
use crate::stock_client::StockClient;

enum Slot {
    Pending,
    Ready(TextureHandle),
    Failed,
}

/// What the renderer should draw for a cached image URL.
pub enum AvatarTexture<'a> {
    Ready(&'a TextureHandle),
    Pending,
    Failed,
}

/// Downloads and decodes item images on the runtime and turns them into
/// egui textures on the UI thread. One download per URL per session; failed
/// URLs are not retried.
pub struct TextureStore {
    client: StockClient,
    runtime: Handle,
    notify: Notify,
    slots: HashMap<String, Slot>,
    tx: Sender<(String, Result<ColorImage, FetchError>)>,
    rx: Receiver<(String, Result<ColorImage, FetchError>)>,
}

impl TextureStore {
    pub fn new(runtime: Handle, client: StockClient, notify: Notify) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            runtime,
            notify,
            slots: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Move finished downloads into textures.
    pub fn pump(&mut self, ctx: &egui::Context) {
        while let Ok((url, result)) = self.rx.try_recv() {
            self.insert(ctx, url, result);
        }
    }

    /// Texture for `url`, starting the download the first time it is asked for.
    pub fn get(&mut self, url: &str) -> AvatarTexture<'_> {
        if !self.slots.contains_key(url) {
            self.request(url);
        }
        self.lookup(url)
    }

    fn lookup(&self, url: &str) -> AvatarTexture<'_> {
        match self.slots.get(url) {
            Some(Slot::Ready(texture)) => AvatarTexture::Ready(texture),
            Some(Slot::Failed) => AvatarTexture::Failed,
            Some(Slot::Pending) | None => AvatarTexture::Pending,
        }
    }

    fn request(&mut self, url: &str) {
        self.slots.insert(url.to_string(), Slot::Pending);

        let client = self.client.clone();
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        let url = url.to_string();

        debug!(url = %url, "downloading image");
        self.runtime.spawn(async move {
            let result = match client.fetch_bytes(&url).await {
                Ok(bytes) => decode_image(&url, &bytes),
                Err(err) => Err(err),
            };
            if tx.send((url, result)).is_ok() {
                notify();
            }
        });
    }

    fn insert(&mut self, ctx: &egui::Context, url: String, result: Result<ColorImage, FetchError>) {
        let slot = match result {
            Ok(image) => Slot::Ready(ctx.load_texture(url.clone(), image, TextureOptions::LINEAR)),
            Err(err) => {
                warn!(error = %err, "image unavailable, using initials");
                Slot::Failed
            }
        };
        self.slots.insert(url, slot);
    }
}

fn decode_image(url: &str, bytes: &[u8]) -> Result<ColorImage, FetchError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| FetchError::Image {
        url: url.to_string(),
        source,
    })?;

    let rgba = decoded.into_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn store() -> TextureStore {
        let client = StockClient::new("http://localhost:8001").unwrap();
        TextureStore::new(Handle::current(), client, Arc::new(|| {}))
    }

    #[test]
    fn decodes_png_into_color_image() {
        let image = decode_image("u", &png_bytes(3, 2)).unwrap();
        assert_eq!(image.size, [3, 2]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let err = decode_image("http://img/koi.png", b"not an image").unwrap_err();
        assert!(matches!(err, FetchError::Image { .. }));
        assert_eq!(err.url(), "http://img/koi.png");
    }

    #[tokio::test]
    async fn unknown_url_is_pending() {
        let store = store();
        assert!(matches!(store.lookup("http://img/a.png"), AvatarTexture::Pending));
    }

    #[tokio::test]
    async fn decoded_results_become_textures() {
        let ctx = egui::Context::default();
        let mut store = store();

        let image = decode_image("a", &png_bytes(4, 4)).unwrap();
        store.tx.send(("http://img/a.png".to_string(), Ok(image))).unwrap();
        store
            .tx
            .send(("http://img/b.png".to_string(), decode_image("b", b"junk")))
            .unwrap();
        store.pump(&ctx);

        match store.lookup("http://img/a.png") {
            AvatarTexture::Ready(texture) => assert_eq!(texture.size(), [4, 4]),
            _ => panic!("expected a texture"),
        }
        assert!(matches!(store.lookup("http://img/b.png"), AvatarTexture::Failed));
    }
}
