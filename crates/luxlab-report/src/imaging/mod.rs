//! Product image acquisition and post-processing.
//!
//! [`ImageProcessor::process`] never fails: any fetch, decode or encode
//! problem is logged and replaced by the deterministic [`placeholder`].

mod render;

use std::time::Duration;

use luxlab_core::ImageBox;
use reqwest::Client;

use crate::error::ImageError;

pub use render::{placeholder, render, Frame};

/// Attempts per image before falling back to the placeholder.
pub const FETCH_ATTEMPTS: u32 = 3;

pub struct ImageProcessor {
    client: Client,
    attempts: u32,
    frame: Option<Frame>,
}

impl ImageProcessor {
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            attempts: FETCH_ATTEMPTS,
            frame: None,
        })
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// JPEG bytes sized to `image_box` for `url`, or the placeholder.
    ///
    /// Returns `None` only if even the placeholder cannot be encoded.
    pub async fn process(&self, url: Option<&str>, quality: u8, image_box: ImageBox) -> Option<Vec<u8>> {
        if let Some(url) = url {
            match self.fetch_and_render(url, quality, image_box).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => {
                    tracing::warn!(url, error = %e, "image processing failed, using placeholder");
                }
            }
        }

        placeholder(image_box, quality)
            .inspect_err(|e| tracing::error!(error = %e, "placeholder encoding failed"))
            .ok()
    }

    async fn fetch_and_render(
        &self,
        url: &str,
        quality: u8,
        image_box: ImageBox,
    ) -> Result<Vec<u8>, ImageError> {
        let raw = self.fetch(url).await?;
        let frame = self.frame;
        tokio::task::spawn_blocking(move || render(&raw, quality, image_box, frame))
            .await
            .map_err(|e| ImageError::Worker(e.to_string()))?
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::debug!(url, attempt, error = %e, "image fetch attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ImageError::EmptyBody {
            url: url.to_owned(),
        }))
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ImageError::EmptyBody {
                url: url.to_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}
