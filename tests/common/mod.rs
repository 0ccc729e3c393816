#![allow(dead_code)]

use async_trait::async_trait;
use kodegen_bundler_compile::bundler::{
    Configuration, Coroutine, Error, Result, Step, TaskKind,
    task::{BuildContext, Task},
    utils::Fetch,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

pub const STUB_BASE: &str = "https://stubs.test/download";

/// Records every requested URI and answers with `payload:<uri>`.
#[derive(Default)]
pub struct CountingFetcher {
    uris: Mutex<Vec<String>>,
    fail: bool,
}

impl CountingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A fetcher whose every request fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn count(&self) -> usize {
        self.uris.lock().unwrap().len()
    }

    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }

    pub fn count_ending_with(&self, suffix: &str) -> usize {
        self.uris()
            .iter()
            .filter(|uri| uri.ends_with(suffix))
            .count()
    }
}

pub fn payload(uri: &str) -> Vec<u8> {
    format!("payload:{uri}").into_bytes()
}

#[async_trait]
impl Fetch for CountingFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        self.uris.lock().unwrap().push(uri.to_string());
        if self.fail {
            return Err(Error::Download {
                uri: uri.to_string(),
                reason: "offline".into(),
            });
        }
        Ok(payload(uri))
    }
}

/// Temp project with an entrypoint and a private download cache.
pub fn project() -> (TempDir, Configuration) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.php"), "<?php echo 'hi';\n").unwrap();

    let config = Configuration::rooted_at(dir.path())
        .unwrap()
        .with_cache_directory(".cache")
        .with_stub_base_uri(STUB_BASE);
    (dir, config)
}

/// Writes a fake archive where packing would put it.
pub fn write_archive(config: &Configuration, contents: &[u8]) -> PathBuf {
    let path = config.archive_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

/// Shell script standing in for the PHP interpreter.
#[cfg(unix)]
pub fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-php");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Runs one task inside a coroutine and collects its steps.
pub async fn run_task<'a, T>(
    task: T,
    config: &'a Configuration,
    fetcher: &'a CountingFetcher,
) -> Result<(Vec<Step>, T::Output)>
where
    T: Task + 'a,
    T::Output: 'a,
{
    Coroutine::<T::Output>::new(|co| async move {
        let ctx = BuildContext { config, fetcher };
        task.run(&ctx, &co).await
    })
    .collect()
    .await
}

/// `(task, phase)` pairs, for comparing step sequences by shape.
pub fn shape(steps: &[Step]) -> Vec<(TaskKind, &'static str)> {
    steps
        .iter()
        .map(|step| (step.task(), step.phase().as_str()))
        .collect()
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}
