//! Profile picture storage.
//!
//! Pictures are uploaded as base64 inside the JSON body, stored out of band
//! and only a `<folder>/<content id>` reference is kept on the record.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use futures::future::LocalBoxFuture;
use ipfs_api_backend_hyper::{IpfsApi, IpfsClient, TryFromUri};
use uuid::Uuid;

use crate::error::ValidationError;

// Keeps request bodies bounded; profile pictures are small.
pub const MAX_PICTURE_BYTES: usize = 2 * 1024 * 1024;

pub trait MediaStore: Send + Sync + 'static {
    /// Stores `bytes` and returns the reference to keep on the record.
    fn put(&self, folder: &str, bytes: Vec<u8>) -> LocalBoxFuture<'_, Result<String>>;
    /// Drops an object previously returned by `put`.
    fn remove(&self, reference: &str) -> LocalBoxFuture<'_, Result<()>>;
}

// The content id is the last segment of a `<folder>/<content id>` reference.
fn content_id(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Media kept on an IPFS node.
pub struct IpfsMediaStore {
    client: IpfsClient,
}

impl IpfsMediaStore {
    pub fn new(client: IpfsClient) -> Self {
        IpfsMediaStore { client }
    }

    /// Client for `api_url`, or the default local node when `None`.
    pub fn connect(api_url: Option<&str>) -> Result<Self> {
        let client = match api_url {
            Some(url) => IpfsClient::from_str(url)
                .map_err(|e| anyhow!("Invalid IPFS API url {}: {}", url, e))?,
            None => IpfsClient::default(),
        };
        Ok(IpfsMediaStore::new(client))
    }
}

impl MediaStore for IpfsMediaStore {
    fn put(&self, folder: &str, bytes: Vec<u8>) -> LocalBoxFuture<'_, Result<String>> {
        let folder = folder.to_owned();
        Box::pin(async move {
            let res = self
                .client
                .add(Cursor::new(bytes))
                .await
                .map_err(|e| anyhow!("Failed to upload to IPFS: {:?}", e))?;
            Ok(format!("{}/{}", folder, res.hash))
        })
    }

    fn remove(&self, reference: &str) -> LocalBoxFuture<'_, Result<()>> {
        let hash = content_id(reference).to_owned();
        Box::pin(async move {
            self.client
                .pin_rm(&hash, true)
                .await
                .map_err(|e| anyhow!("Failed to unpin {} on IPFS: {:?}", hash, e))?;
            Ok(())
        })
    }
}

/// Media kept in process memory, keyed by the returned reference.
#[derive(Default)]
pub struct MemoryMediaStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryMediaStore {
    pub fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl MediaStore for MemoryMediaStore {
    fn put(&self, folder: &str, bytes: Vec<u8>) -> LocalBoxFuture<'_, Result<String>> {
        let reference = format!("{}/{}", folder, Uuid::new_v4().simple());
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.clone(), bytes);
        Box::pin(async move { Ok(reference) })
    }

    fn remove(&self, reference: &str) -> LocalBoxFuture<'_, Result<()>> {
        let removed = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reference);
        let result = match removed {
            Some(_) => Ok(()),
            None => Err(anyhow!("No media stored under {}", reference)),
        };
        Box::pin(async move { result })
    }
}

// Decode base64 to bytes
pub fn decode_picture(data: &str) -> Result<Vec<u8>, ValidationError> {
    let bytes = general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| ValidationError::new("profile_pic_base64", format!("not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ValidationError::new("profile_pic_base64", "picture is empty"));
    }
    if bytes.len() > MAX_PICTURE_BYTES {
        return Err(ValidationError::new(
            "profile_pic_base64",
            format!("picture exceeds {} bytes", MAX_PICTURE_BYTES),
        ));
    }
    Ok(bytes)
}

// Encode bytes to base64
#[cfg(test)]
pub(crate) fn encode_picture(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}
