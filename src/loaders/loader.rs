//! One-shot asset fetch and image decoding.

use crate::core::Error;
use crate::texture::Image;
use std::sync::Arc;

/// Error type for decoding fetched assets.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadError {
    /// Error message.
    pub message: String,
    /// Source file if known.
    pub source: Option<String>,
}

impl LoadError {
    /// Create a new load error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create with source file.
    pub fn with_source(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref source) = self.source {
            write!(f, "{}: {}", source, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for LoadError {}

/// Decode a PNG or JPEG into an RGBA8 image.
pub fn decode_image(bytes: &[u8]) -> Result<Image, LoadError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| LoadError::new(format!("Failed to decode image: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Ok(Image::new(width, height, rgba.into_raw()))
}

/// Fetch an image by URL and decode it.
pub async fn load_image(url: &str) -> Result<Arc<Image>, Error> {
    let bytes = fetch_bytes(url).await?;
    let image = decode_image(&bytes).map_err(|e| LoadError::with_source(e.message, url))?;
    log::info!("loaded image {} ({}x{})", url, image.width, image.height);
    Ok(Arc::new(image))
}

/// Fetch the bytes behind a URL with the browser's `fetch`.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, Error> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fetch_error = |reason: String| Error::AssetFetch {
        url: url.to_owned(),
        reason,
    };
    let describe = |value: wasm_bindgen::JsValue| format!("{:?}", value);

    let window = web_sys::window().ok_or_else(|| fetch_error("no window".into()))?;
    let opts = web_sys::RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(web_sys::RequestMode::SameOrigin);
    let request = web_sys::Request::new_with_str_and_init(url, &opts).map_err(|e| fetch_error(describe(e)))?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| fetch_error(describe(e)))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| fetch_error("fetch did not return a Response".into()))?;
    if !response.ok() {
        return Err(fetch_error(format!("HTTP {}", response.status())));
    }

    let buffer = response.array_buffer().map_err(|e| fetch_error(describe(e)))?;
    let buffer = JsFuture::from(buffer).await.map_err(|e| fetch_error(describe(e)))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Read the bytes behind a path from the local filesystem.
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(url).map_err(|e| Error::AssetFetch {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 128])
            }
        });
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png_bytes()).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let err = pollster::block_on(fetch_bytes("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, Error::AssetFetch { ref url, .. } if url == "/definitely/not/here.png"));
    }

    #[test]
    fn test_load_error_display() {
        assert_eq!(LoadError::with_source("bad header", "Fox.glb").to_string(), "Fox.glb: bad header");
    }
}
