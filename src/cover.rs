use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::debug;

use crate::clients::errors::Result;

/// Keeps the now-playing cover on disk.
///
/// The image is written next to the target and renamed over it, so anything
/// watching the file never reads half an image. Without a path the switcher
/// only tracks which cover is current.
pub struct CoverSwitcher {
    path: Option<PathBuf>,
    current: Option<Bytes>,
}

impl CoverSwitcher {
    pub fn new(path: Option<PathBuf>) -> Self {
        CoverSwitcher {
            path,
            current: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<&Bytes> {
        self.current.as_ref()
    }

    /// Show `cover`, or clear the image for `None`. Returns `false` when
    /// `cover` is already showing.
    pub async fn switch(&mut self, cover: Option<Bytes>) -> Result<bool> {
        if cover == self.current {
            return Ok(false);
        }

        if let Some(path) = &self.path {
            match &cover {
                Some(data) => write_swapped(path, data).await?,
                None => match tokio::fs::remove_file(path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                },
            }
            debug!("Cover at {} switched", path.display());
        }

        self.current = cover;
        Ok(true)
    }
}

async fn write_swapped(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".next");
    let staging = PathBuf::from(staging);

    tokio::fs::write(&staging, data).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}
