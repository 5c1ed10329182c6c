use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to download wallpaper: {0}")]
    Download(#[from] reqwest::Error),
    #[error("wallpaper server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("wallpaper cache io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A wallpaper available on local disk
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedWallpaper {
    /// Absolute path to the cached image
    pub path: String,
    /// Whether it was already cached (true) or freshly downloaded (false)
    pub cached: bool,
}

/// Extension taken from the URL path, defaulting to jpg
fn extension_for(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((_, ext)) if matches!(ext, "jpg" | "jpeg" | "png" | "webp" | "gif") => ext,
        _ => "jpg",
    }
}

/// Generate a cache key from URL (hash-based filename)
fn url_to_filename(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:x}.{}", hasher.finish(), extension_for(url))
}

/// Remote wallpapers downloaded once into the app data directory
pub struct WallpaperCache {
    dir: PathBuf,
}

impl WallpaperCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.dir.join(url_to_filename(url))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache_path(url).exists()
    }

    /// Return the cached copy of `url`, downloading it first if needed.
    pub async fn fetch(&self, url: &str) -> Result<CachedWallpaper, AssetError> {
        let file_path = self.cache_path(url);
        if self.is_cached(url) {
            return Ok(CachedWallpaper {
                path: file_path.to_string_lossy().to_string(),
                cached: true,
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let response = reqwest::get(url).await?;
        if !response.status().is_success() {
            return Err(AssetError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(&file_path, &bytes).await?;
        info!(url, bytes = bytes.len(), "wallpaper cached");

        Ok(CachedWallpaper {
            path: file_path.to_string_lossy().to_string(),
            cached: false,
        })
    }

    pub async fn clear(&self) -> Result<(), AssetError> {
        if self.dir.exists() {
            tokio::fs::remove_dir_all(&self.dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_stable_and_keeps_extension() {
        let a = url_to_filename("https://example.com/walls/dune.png?w=1920");
        let b = url_to_filename("https://example.com/walls/dune.png?w=1920");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert!(url_to_filename("https://example.com/random").ends_with(".jpg"));
    }

    #[tokio::test]
    async fn existing_file_is_served_from_cache() {
        let dir = std::env::temp_dir().join(format!("foliodesk-walls-{}", uuid::Uuid::new_v4()));
        let cache = WallpaperCache::new(dir.clone());
        let url = "https://example.invalid/sky.webp";

        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(cache.cache_path(url), b"img").unwrap();

        assert!(cache.is_cached(url));
        let hit = cache.fetch(url).await.unwrap();
        assert!(hit.cached);

        cache.clear().await.unwrap();
        assert!(!cache.is_cached(url));
    }
}
