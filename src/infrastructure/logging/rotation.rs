//! Log file rotation and retention cleanup.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LogRotator {
    retention_days: u32,
    max_file_size: u64,
}

impl LogRotator {
    pub fn new(retention_days: u32, max_file_size: u64) -> Self {
        Self {
            retention_days,
            max_file_size,
        }
    }

    pub async fn should_rotate(&self, log_path: impl AsRef<Path>) -> Result<bool> {
        let log_path = log_path.as_ref();

        if !log_path.exists() {
            return Ok(false);
        }

        let metadata = tokio::fs::metadata(log_path)
            .await
            .context("failed to get log file metadata")?;

        let size = metadata.len();
        debug!(path = %log_path.display(), size, max_size = self.max_file_size, "checking if log rotation needed");

        Ok(size >= self.max_file_size)
    }

    pub async fn rotate_if_needed(&self, log_path: impl AsRef<Path>) -> Result<()> {
        let log_path = log_path.as_ref();

        if !self.should_rotate(log_path).await? {
            return Ok(());
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");

        let rotated_path = if let Some(ext) = log_path.extension() {
            log_path.with_extension(format!("{}.{}", ext.to_string_lossy(), timestamp))
        } else {
            PathBuf::from(format!("{}.{}", log_path.display(), timestamp))
        };

        tokio::fs::rename(log_path, &rotated_path)
            .await
            .context("failed to rotate log file")?;

        info!(old_path = %log_path.display(), new_path = %rotated_path.display(), "rotated log file");

        Ok(())
    }

    pub async fn cleanup_old_logs(&self, log_dir: impl AsRef<Path>) -> Result<usize> {
        let log_dir = log_dir.as_ref();

        if !log_dir.exists() {
            warn!(path = %log_dir.display(), "log directory does not exist");
            return Ok(0);
        }

        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let mut deleted_count = 0;

        let mut entries = tokio::fs::read_dir(log_dir).await.context("failed to read log directory")?;

        while let Some(entry) = entries.next_entry().await.context("failed to read directory entry")? {
            let path = entry.path();

            match path.extension().and_then(|s| s.to_str()) {
                Some(ext_str) if ext_str.starts_with("log") => {}
                _ => continue,
            }

            let metadata = tokio::fs::metadata(&path).await.context("failed to get file metadata")?;
            let modified = metadata.modified().context("failed to get file modification time")?;
            let modified_dt: DateTime<Utc> = modified.into();

            if modified_dt < cutoff {
                tokio::fs::remove_file(&path).await.context("failed to delete old log file")?;
                info!(path = %path.display(), age_days = (Utc::now() - modified_dt).num_days(), "deleted old log file");
                deleted_count += 1;
            }
        }

        if deleted_count > 0 {
            info!(count = deleted_count, "cleaned up old log files");
        }

        Ok(deleted_count)
    }

    /// Long-running task: runs `cleanup_old_logs` on a fixed interval.
    pub async fn run_periodic_cleanup(&self, log_dir: impl AsRef<Path>, interval: std::time::Duration) -> Result<()> {
        let log_dir = log_dir.as_ref().to_path_buf();
        let mut interval_timer = tokio::time::interval(interval);

        loop {
            interval_timer.tick().await;

            match self.cleanup_old_logs(&log_dir).await {
                Ok(count) if count > 0 => info!(count, "periodic cleanup completed"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "failed to run periodic cleanup"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn should_rotate_when_file_exceeds_size() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let mut file = std::fs::File::create(&log_path).unwrap();
        file.write_all(&vec![0u8; 2048]).unwrap();
        drop(file);

        let rotator = LogRotator::new(30, 1024);
        assert!(rotator.should_rotate(&log_path).await.unwrap());
    }

    #[tokio::test]
    async fn should_not_rotate_when_file_under_size() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");
        std::fs::write(&log_path, b"small content").unwrap();

        let rotator = LogRotator::new(30, 1024);
        assert!(!rotator.should_rotate(&log_path).await.unwrap());
    }

    #[tokio::test]
    async fn rotate_if_needed_renames_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");
        std::fs::write(&log_path, vec![0u8; 2048]).unwrap();

        let rotator = LogRotator::new(30, 1024);
        rotator.rotate_if_needed(&log_path).await.unwrap();

        assert!(!log_path.exists());
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].file_name().unwrap().to_str().unwrap().starts_with("test.log."));
    }

    #[tokio::test]
    async fn cleanup_old_logs_ignores_non_log_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("data.txt"), b"text").unwrap();
        std::fs::write(temp_dir.path().join("test.log"), b"log").unwrap();

        let rotator = LogRotator::new(0, 1024);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let _ = rotator.cleanup_old_logs(temp_dir.path()).await.unwrap();

        assert!(temp_dir.path().join("data.txt").exists());
    }

    #[tokio::test]
    async fn cleanup_handles_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing_dir = temp_dir.path().join("nonexistent");

        let rotator = LogRotator::new(30, 1024);
        assert_eq!(rotator.cleanup_old_logs(&missing_dir).await.unwrap(), 0);
    }
}
