mod common;

use common::{CountingFetcher, run_task, shape};
use kodegen_bundler_compile::bundler::{
    Error, Level, Os, Phase, TaskKind,
    task::{
        ApplyPermissions, AssembleTarget, ClearDirectory, CopyFile, CopyFiles, CreateDirectory,
        Download, WriteLoaderStub, WriteManifest, assemble::INI_MAGIC,
    },
};
use std::collections::BTreeMap;

#[tokio::test]
async fn create_directory_is_idempotent() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let path = dir.path().join("a/b/c");

    let (first, ()) = run_task(CreateDirectory::new(&path), &config, &fetcher)
        .await
        .unwrap();
    let (second, ()) = run_task(CreateDirectory::new(&path), &config, &fetcher)
        .await
        .unwrap();

    assert!(path.is_dir());
    assert_eq!(shape(&first), shape(&second));
    assert_eq!(
        shape(&first),
        [
            (TaskKind::CreateDirectory, "ready"),
            (TaskKind::CreateDirectory, "running"),
            (TaskKind::CreateDirectory, "completed"),
        ]
    );
}

#[tokio::test]
async fn clear_directory_removes_contents_and_tolerates_absence() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let path = dir.path().join("out");
    std::fs::create_dir_all(path.join("nested")).unwrap();
    std::fs::write(path.join("nested/file"), "x").unwrap();

    run_task(ClearDirectory::new(&path), &config, &fetcher)
        .await
        .unwrap();
    assert!(!path.exists());

    let (steps, ()) = run_task(ClearDirectory::new(&path), &config, &fetcher)
        .await
        .unwrap();
    assert_eq!(steps.len(), 3);
}

#[tokio::test]
async fn copy_file_creates_parents() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let from = dir.path().join("index.php");
    let to = dir.path().join("deep/er/copy.php");

    let (steps, copied) = run_task(CopyFile::new(&from, &to), &config, &fetcher)
        .await
        .unwrap();

    assert_eq!(copied, to);
    assert_eq!(common::read(&to), common::read(&from));
    let completed = steps.last().unwrap();
    assert!(completed.is(TaskKind::CopyFile, Phase::Completed));
    assert_eq!(completed.get("bytes"), Some("17"));
}

#[cfg(unix)]
#[tokio::test]
async fn copy_file_keeps_permission_bits() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let from = dir.path().join("run.sh");
    std::fs::write(&from, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&from, std::fs::Permissions::from_mode(0o750)).unwrap();
    let to = dir.path().join("copy/run.sh");

    run_task(CopyFile::new(&from, &to), &config, &fetcher)
        .await
        .unwrap();

    let mode = std::fs::metadata(&to).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[tokio::test]
async fn copy_file_rejects_directories() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();

    let error = run_task(
        CopyFile::new(dir.path(), dir.path().join("copy")),
        &config,
        &fetcher,
    )
    .await
    .unwrap_err();

    assert!(error.to_string().contains("is not a file"));
}

#[tokio::test]
async fn copy_files_keeps_names() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let a = dir.path().join("a.so");
    let b = dir.path().join("b.so");
    std::fs::write(&a, "a").unwrap();
    std::fs::write(&b, "b").unwrap();
    let destination = dir.path().join("libs-out");

    let (steps, copied) = run_task(
        CopyFiles::new(vec![a, b], &destination),
        &config,
        &fetcher,
    )
    .await
    .unwrap();

    assert_eq!(copied, [destination.join("a.so"), destination.join("b.so")]);
    let running = steps
        .iter()
        .filter(|step| step.is(TaskKind::CopyFiles, Phase::Running))
        .count();
    assert_eq!(running, 2);
}

#[tokio::test]
async fn download_fetches_once_then_hits_the_cache() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let uri = "https://files.test/tool.phar";
    let destination = dir.path().join("cache/tool.phar");

    let (first, path) = run_task(Download::new(uri, &destination), &config, &fetcher)
        .await
        .unwrap();
    let (second, _) = run_task(Download::new(uri, &destination), &config, &fetcher)
        .await
        .unwrap();

    assert_eq!(path, destination);
    assert_eq!(fetcher.count(), 1);
    assert_eq!(common::read(&destination), common::payload(uri));
    assert!(!destination.with_extension("part").exists());

    assert_eq!(shape(&first), shape(&second));
    assert_eq!(first[1].level(), Level::Progress);
    assert_eq!(second[1].level(), Level::Info);
    assert_eq!(second[1].get("cached"), Some("true"));
}

#[tokio::test]
async fn empty_cached_file_is_downloaded_again() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let destination = dir.path().join("cache/empty.bin");
    std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
    std::fs::write(&destination, "").unwrap();

    run_task(
        Download::new("https://files.test/empty.bin", &destination),
        &config,
        &fetcher,
    )
    .await
    .unwrap();

    assert_eq!(fetcher.count(), 1);
    assert!(!common::read(&destination).is_empty());
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::failing();
    let destination = dir.path().join("cache/missing.bin");

    let error = run_task(
        Download::new("https://files.test/missing.bin", &destination),
        &config,
        &fetcher,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::Download { .. }));
    assert!(!destination.exists());
}

#[tokio::test]
async fn windows_permissions_still_report_steps() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let path = dir.path().join("index.php");

    let (steps, ()) = run_task(ApplyPermissions::new(&path, Os::Windows), &config, &fetcher)
        .await
        .unwrap();

    assert_eq!(
        shape(&steps),
        [
            (TaskKind::ApplyPermissions, "ready"),
            (TaskKind::ApplyPermissions, "running"),
            (TaskKind::ApplyPermissions, "completed"),
        ]
    );
}

fn assemble(dir: &std::path::Path, os: Os, ini: BTreeMap<String, String>) -> AssembleTarget {
    std::fs::write(dir.join("runtime.stub"), b"STUB").unwrap();
    std::fs::write(dir.join("app.phar"), b"ARCHIVE").unwrap();
    AssembleTarget {
        os,
        stub: dir.join("runtime.stub"),
        archive: dir.join("app.phar"),
        ini,
        directory: dir.join("out"),
        name: "app".into(),
    }
}

#[tokio::test]
async fn windows_executable_gets_suffix_and_no_permission_step() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();

    let (steps, path) = run_task(
        assemble(dir.path(), Os::Windows, BTreeMap::new()),
        &config,
        &fetcher,
    )
    .await
    .unwrap();

    assert_eq!(path, dir.path().join("out/app.exe"));
    assert_eq!(common::read(&path), b"STUBARCHIVE");
    assert!(steps.iter().all(|step| step.task() == TaskKind::AssembleTarget));
}

#[tokio::test]
async fn posix_executable_embeds_ini_and_is_marked_executable() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let ini = BTreeMap::from([("memory_limit".to_string(), "1G".to_string())]);

    let (steps, path) = run_task(assemble(dir.path(), Os::Linux, ini), &config, &fetcher)
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("out/app"));
    let bytes = common::read(&path);
    let text = b"memory_limit=1G\n";
    assert!(bytes.starts_with(b"STUB"));
    assert_eq!(&bytes[4..8], &INI_MAGIC);
    assert_eq!(&bytes[8..12], &(text.len() as u32).to_be_bytes());
    assert_eq!(&bytes[12..12 + text.len()], text);
    assert!(bytes.ends_with(b"ARCHIVE"));

    assert_eq!(
        shape(&steps),
        [
            (TaskKind::AssembleTarget, "ready"),
            (TaskKind::AssembleTarget, "running"),
            (TaskKind::AssembleTarget, "completed"),
            (TaskKind::ApplyPermissions, "ready"),
            (TaskKind::ApplyPermissions, "running"),
            (TaskKind::ApplyPermissions, "completed"),
        ]
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[tokio::test]
async fn missing_stub_fails_the_assembly() {
    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let mut task = assemble(dir.path(), Os::Linux, BTreeMap::new());
    task.stub = dir.path().join("absent.stub");

    let error = run_task(task, &config, &fetcher).await.unwrap_err();

    assert!(matches!(error, Error::Fs { .. }));
}

#[tokio::test]
async fn manifest_and_loader_land_in_the_temp_directory() {
    let (_dir, config) = common::project();
    let config = config.with_name("demo").with_timestamp(0);
    let fetcher = CountingFetcher::new();

    let (_, manifest) = run_task(WriteManifest, &config, &fetcher).await.unwrap();
    let (_, loader) = run_task(WriteLoaderStub, &config, &fetcher).await.unwrap();

    assert_eq!(manifest, config.manifest_path());
    assert_eq!(loader, config.loader_path());

    let document: serde_json::Value = serde_json::from_slice(&common::read(&manifest)).unwrap();
    assert_eq!(document["alias"], "demo.phar");
    assert_eq!(document["main"], "build/.build/loader.php");
    assert_eq!(document["files"][0], "index.php");

    let script = String::from_utf8(common::read(&loader)).unwrap();
    assert!(script.contains("index.php"));
}

#[cfg(unix)]
#[tokio::test]
async fn bundler_failure_carries_exit_code_and_output() {
    use kodegen_bundler_compile::bundler::task::InvokeBundler;

    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let php = common::fake_interpreter(dir.path(), "echo 'compiling'\necho 'broken manifest' >&2\nexit 3");

    let error = run_task(
        InvokeBundler::new(&php, dir.path().join("box.phar"), config.manifest_path()),
        &config,
        &fetcher,
    )
    .await
    .unwrap_err();

    match error {
        Error::BundleToolFailed { status, output } => {
            assert_eq!(status, Some(3));
            assert!(output.contains("compiling"));
            assert!(output.contains("broken manifest"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn bundler_success_without_archive_is_a_failure() {
    use kodegen_bundler_compile::bundler::task::InvokeBundler;

    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let php = common::fake_interpreter(dir.path(), "exit 0");
    let stale = common::write_archive(&config, b"STALE");

    let error = run_task(
        InvokeBundler::new(&php, dir.path().join("box.phar"), config.manifest_path()),
        &config,
        &fetcher,
    )
    .await
    .unwrap_err();

    assert!(error.to_string().contains("was not written"));
    assert!(!stale.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn bundler_is_killed_after_the_timeout() {
    use kodegen_bundler_compile::bundler::task::InvokeBundler;
    use std::time::Duration;

    let (dir, config) = common::project();
    let fetcher = CountingFetcher::new();
    let php = common::fake_interpreter(dir.path(), "exec sleep 30");

    let error = run_task(
        InvokeBundler::new(&php, dir.path().join("box.phar"), config.manifest_path())
            .with_timeout(Duration::from_millis(200)),
        &config,
        &fetcher,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::BundleToolFailed { status: None, .. }));
    assert!(error.to_string().contains("timed out"));
}
