use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock held while a writer replaces the task store file.
///
/// Uses `flock` on Unix so concurrent `ct` processes take turns. The lock
/// file sits next to the store file and is never deleted, so every writer
/// locks the same inode. The flock is released when the handle drops.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another ct process is writing")]
    Timeout { path: PathBuf },
}

impl StoreLock {
    /// Lock the store at `store_file`, waiting up to `timeout`.
    pub fn acquire(store_file: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = lock_path(store_file);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::CreateError {
                path: path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(StoreLock { _file: file, path })
    }

    /// The lock file this guard holds
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(store_file: &Path) -> PathBuf {
    let mut name = store_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    store_file.with_file_name(name)
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
