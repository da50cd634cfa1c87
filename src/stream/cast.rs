//! Chromecast control via catt CLI
//!
//! Sends a play command for a URL to a device addressed by IP.

use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Errors from device control
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("'{0}' not found. Install with: pip install catt")]
    NotFound(String),
    #[error("Failed to run cast command: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cast to {address} failed: {message}")]
    Rejected { address: IpAddr, message: String },
}

/// Something that can make a playback device play a URL
#[async_trait]
pub trait DeviceController: Send + Sync {
    async fn play(&self, address: IpAddr, url: &str) -> Result<(), DeviceError>;
}

/// Device controller backed by the catt CLI
pub struct Catt {
    catt_path: String,
}

impl Catt {
    pub fn new() -> Self {
        Self::with_path("catt")
    }

    /// Create with custom catt path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            catt_path: path.into(),
        }
    }

    /// Arguments for `catt -d <address> cast <url>`
    pub fn args(address: IpAddr, url: &str) -> Vec<String> {
        vec![
            "-d".to_string(),
            address.to_string(),
            "cast".to_string(),
            url.to_string(),
        ]
    }
}

impl Default for Catt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceController for Catt {
    async fn play(&self, address: IpAddr, url: &str) -> Result<(), DeviceError> {
        let output = Command::new(&self.catt_path)
            .args(Self::args(address, url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DeviceError::NotFound(self.catt_path.clone())
                } else {
                    DeviceError::Io(e)
                }
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(DeviceError::Rejected { address, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_forms_correct_command() {
        let address: IpAddr = "192.168.1.50".parse().unwrap();
        assert_eq!(
            Catt::args(address, "https://cdn/480.m3u8"),
            vec!["-d", "192.168.1.50", "cast", "https://cdn/480.m3u8"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let catt = Catt::with_path("/nonexistent/catt-binary");
        let err = catt
            .play("127.0.0.1".parse().unwrap(), "http://x")
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));
    }
}
