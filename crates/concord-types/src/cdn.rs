//! CDN image URL options.

use std::fmt;

/// Base URL for Discord's image CDN.
pub const CDN_BASE_URL: &str = "https://cdn.discordapp.com";

/// Default image edge length in pixels.
pub const DEFAULT_IMAGE_SIZE: u16 = 512;

/// Image encoding requested from the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageFormat {
    /// File extension used in CDN paths.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Format and size for a CDN image link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub format: ImageFormat,
    pub size: u16,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            size: DEFAULT_IMAGE_SIZE,
        }
    }
}

impl ImageOptions {
    /// Set the image format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the image size.
    pub fn with_size(mut self, size: u16) -> Self {
        self.size = size;
        self
    }

    /// Build a CDN URL for `{kind}/{owner}/{hash}`.
    pub fn url(&self, kind: &str, owner: &str, hash: &str) -> String {
        format!(
            "{}/{}/{}/{}.{}?size={}",
            CDN_BASE_URL,
            kind,
            owner,
            hash,
            self.format.extension(),
            self.size
        )
    }
}
