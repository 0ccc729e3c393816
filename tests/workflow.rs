mod common;

use common::{CountingFetcher, STUB_BASE};
use kodegen_bundler_compile::bundler::{
    CompileOptions, Compiler, Configuration, Error, Phase, Step, TargetDescriptor, TaskKind,
};
use std::sync::Arc;

const NO_PACK: CompileOptions = CompileOptions { pack: false };

fn compiler(config: Configuration, fetcher: &Arc<CountingFetcher>) -> Compiler {
    Compiler::new(config).unwrap().with_fetcher(fetcher.clone())
}

fn milestones(steps: &[Step]) -> Vec<(TaskKind, Phase, String)> {
    steps
        .iter()
        .filter(|step| matches!(step.task(), TaskKind::Compile | TaskKind::Target | TaskKind::Pack))
        .map(|step| (step.task(), step.phase(), step.get("target").unwrap_or("").to_string()))
        .collect()
}

fn linux_amd64(config: Configuration) -> Configuration {
    config.with_platform(["linux"]).with_arch(["amd64"])
}

#[tokio::test]
async fn linux_amd64_executable_is_stub_plus_archive() {
    let (_dir, config) = common::project();
    let config = linux_amd64(config);
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let (_, artifacts) = compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    let stub_uri = format!("{STUB_BASE}/linux-amd64.minimal.stub");
    assert_eq!(fetcher.uris(), [stub_uri.clone()]);

    let executable = config.output().join("linux/amd64/app");
    let mut expected = common::payload(&stub_uri);
    expected.extend_from_slice(b"ARCHIVE");
    assert_eq!(common::read(&executable), expected);

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].kind, "linux");
    assert_eq!(artifacts[0].path, executable);
    assert_eq!(artifacts[0].size, expected.len() as u64);
    assert_eq!(artifacts[0].sha256.len(), 64);
}

#[tokio::test]
async fn ini_settings_are_embedded_between_stub_and_archive() {
    let (_dir, config) = common::project();
    let config = linux_amd64(config).with_ini("memory_limit", "512M");
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    let bytes = common::read(&config.output().join("linux/amd64/app"));
    let stub = common::payload(&format!("{STUB_BASE}/linux-amd64.minimal.stub"));
    let text = b"memory_limit=512M\n";
    assert_eq!(&bytes[..stub.len()], stub.as_slice());
    assert_eq!(
        &bytes[stub.len()..stub.len() + 4],
        &[0xFD, 0xF6, 0x69, 0xE6]
    );
    assert!(bytes.ends_with(b"ARCHIVE"));
    assert_eq!(bytes.len(), stub.len() + 8 + text.len() + b"ARCHIVE".len());
}

/// Task kinds between a target's Ready and Completed steps, with
/// consecutive repeats collapsed.
fn target_window(steps: &[Step], label: &str) -> (usize, usize, Vec<TaskKind>) {
    let position = |phase: Phase| {
        steps
            .iter()
            .position(|step| {
                step.task() == TaskKind::Target
                    && step.phase() == phase
                    && step.get("target") == Some(label)
            })
            .unwrap()
    };
    let (start, end) = (position(Phase::Ready), position(Phase::Completed));

    let mut kinds: Vec<TaskKind> = steps[start + 1..end].iter().map(Step::task).collect();
    kinds.dedup();
    (start, end, kinds)
}

#[tokio::test]
async fn targets_build_in_order_between_compile_milestones() {
    let (_dir, config) = common::project();
    let config = config
        .with_platform(["linux", "archive"])
        .with_arch(["amd64"]);
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let (steps, artifacts) = compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert_eq!(
        milestones(&steps),
        [
            (TaskKind::Compile, Phase::Ready, String::new()),
            (TaskKind::Target, Phase::Ready, "linux/amd64".into()),
            (TaskKind::Target, Phase::Completed, "linux/amd64".into()),
            (TaskKind::Target, Phase::Ready, "archive".into()),
            (TaskKind::Target, Phase::Completed, "archive".into()),
            (TaskKind::Compile, Phase::Completed, String::new()),
        ]
    );
    assert_eq!(artifacts.len(), 2);

    let (_, linux_end, linux) = target_window(&steps, "linux/amd64");
    let (archive_start, _, archive) = target_window(&steps, "archive");
    assert!(linux_end < archive_start);

    assert_eq!(linux[..2], [TaskKind::ClearDirectory, TaskKind::CreateDirectory]);
    assert_eq!(linux.last(), Some(&TaskKind::ApplyPermissions));
    assert!(linux[2..].contains(&TaskKind::AssembleTarget));
    assert!(!linux[2..].contains(&TaskKind::ClearDirectory));
    assert_eq!(
        archive,
        [TaskKind::ClearDirectory, TaskKind::CreateDirectory, TaskKind::CopyFile]
    );

    let directories = |kind: TaskKind| -> Vec<String> {
        steps
            .iter()
            .filter(|step| step.task() == kind && step.phase() == Phase::Completed)
            .filter_map(|step| step.get("path").map(str::to_string))
            .collect()
    };
    let expected = [
        config.output().join("linux/amd64").display().to_string(),
        config.output().join("archive").display().to_string(),
    ];
    assert_eq!(directories(TaskKind::ClearDirectory), expected);
    assert_eq!(directories(TaskKind::CreateDirectory), expected);
}

#[tokio::test]
async fn escaping_output_fails_before_anything_is_cleared() {
    let (dir, config) = common::project();
    let source = dir.path().join("src");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("keep.php"), "<?php\n").unwrap();
    let config = config.with_target(TargetDescriptor::new("archive").with_output("../src"));
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let error = compiler(config, &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::InvalidTargetOutput { .. }), "{error}");
    assert!(error.is_configuration_error());
    assert!(source.join("keep.php").is_file());
}

#[tokio::test]
async fn nested_output_fails_before_earlier_target_is_built() {
    let (_dir, config) = common::project();
    let config = config
        .with_target(TargetDescriptor::new("linux").with_arch("amd64"))
        .with_target(TargetDescriptor::new("archive").with_output("linux"));
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let error = compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::DuplicateTargetOutput { .. }), "{error}");
    assert!(!config.output().join("linux").exists());
    assert_eq!(fetcher.count(), 0);
}

#[tokio::test]
async fn stub_is_fetched_once_per_os_arch_and_edition() {
    let (_dir, config) = common::project();
    let config = config
        .with_target(TargetDescriptor::new("linux").with_arch("amd64").with_output("one"))
        .with_target(TargetDescriptor::new("linux").with_arch("amd64").with_output("two"));
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert_eq!(fetcher.count_ending_with("linux-amd64.minimal.stub"), 1);
    assert!(config.output().join("one/app").is_file());
    assert!(config.output().join("two/app").is_file());
    assert!(config
        .stub_cache_directory()
        .join("linux-amd64.minimal.stub")
        .is_file());

    compiler(config, &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();
    assert_eq!(fetcher.count(), 1);
}

#[tokio::test]
async fn local_stub_directory_wins_over_download() {
    let (dir, config) = common::project();
    let config = linux_amd64(config);
    std::fs::create_dir_all(dir.path().join("stubs")).unwrap();
    std::fs::write(dir.path().join("stubs/linux-amd64.minimal.stub"), b"LOCAL").unwrap();
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert_eq!(fetcher.count(), 0);
    assert_eq!(
        common::read(&config.output().join("linux/amd64/app")),
        b"LOCALARCHIVE"
    );
}

#[tokio::test]
async fn required_extensions_pick_a_larger_edition() {
    let (_dir, config) = common::project();
    let config = config
        .with_platform(["windows"])
        .with_arch(["amd64"])
        .with_extensions(["intl"]);
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert_eq!(fetcher.uris(), [format!("{STUB_BASE}/windows-amd64.full.stub")]);
    assert!(config.output().join("windows/amd64/app.exe").is_file());
}

#[tokio::test]
async fn custom_stub_skips_edition_selection() {
    let (dir, config) = common::project();
    std::fs::write(dir.path().join("my.stub"), b"MINE").unwrap();
    let config = config
        .with_extensions(["xdebug"])
        .with_target(TargetDescriptor::new("linux").with_stub("my.stub"));
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert_eq!(fetcher.count(), 0);
    assert_eq!(
        common::read(&config.output().join("linux/amd64/app")),
        b"MINEARCHIVE"
    );
}

#[tokio::test]
async fn missing_capability_fails_before_anything_is_written() {
    let (_dir, config) = common::project();
    let config = linux_amd64(config).with_extensions(["xdebug"]);
    let fetcher = CountingFetcher::new();

    let compiler = compiler(config.clone(), &fetcher);
    let mut run = compiler.compile(CompileOptions::default());
    let first = run.next().await.unwrap();

    match first {
        Err(Error::MissingCapabilities {
            platform,
            missing,
            remediation,
            ..
        }) => {
            assert_eq!(platform, "linux");
            assert_eq!(missing, ["xdebug"]);
            assert!(remediation.is_none());
        }
        other => panic!("unexpected first item: {other:?}"),
    }
    assert!(run.next().await.is_none());
    assert!(!config.output().exists());
    assert_eq!(fetcher.count(), 0);
}

#[tokio::test]
async fn macos_miss_suggests_a_custom_stub() {
    let (_dir, config) = common::project();
    let config = config
        .with_platform(["macos"])
        .with_arch(["arm64"])
        .with_extensions(["gd"]);
    let fetcher = CountingFetcher::new();

    let error = compiler(config, &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap_err();

    let Error::MissingCapabilities { remediation, .. } = error else {
        panic!("unexpected error");
    };
    let remediation = remediation.unwrap();
    assert_eq!(remediation.steps.len(), 3);
    assert!(remediation.steps[2].contains("\"stub\""));
}

#[tokio::test]
async fn failing_target_keeps_earlier_outputs() {
    let (_dir, config) = common::project();
    let config = config
        .with_target(TargetDescriptor::new("linux").with_arch("amd64"))
        .with_target(
            TargetDescriptor::new("linux")
                .with_arch("arm64")
                .with_stub("missing.stub"),
        );
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let error = compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Fs { .. }));
    assert!(config.output().join("linux/amd64/app").is_file());
    assert!(!config.output().join("linux/arm64/app").exists());
}

#[tokio::test]
async fn rebuilding_a_target_clears_stale_files() {
    let (_dir, config) = common::project();
    let config = linux_amd64(config);
    common::write_archive(&config, b"ARCHIVE");
    let stale = config.output().join("linux/amd64/stale.txt");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "old").unwrap();
    let fetcher = CountingFetcher::new();

    compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    assert!(!stale.exists());
    assert!(config.archive_path().is_file());
}

#[tokio::test]
async fn companion_libraries_follow_their_targets() {
    let (dir, config) = common::project();
    let libs = dir.path().join("libs");
    std::fs::create_dir_all(&libs).unwrap();
    for name in ["sass-linux-amd64.so", "sass-windows-amd64.dll", "notes.txt"] {
        std::fs::write(libs.join(name), name).unwrap();
    }
    let config = config
        .with_platform(["linux", "archive"])
        .with_arch(["amd64"]);
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();

    let (_, artifacts) = compiler(config.clone(), &fetcher)
        .compile(NO_PACK)
        .collect()
        .await
        .unwrap();

    let native = config.output().join("linux/amd64");
    assert!(native.join("sass-linux-amd64.so").is_file());
    assert!(!native.join("sass-windows-amd64.dll").exists());

    let archive = config.output().join("archive");
    assert_eq!(common::read(&archive.join("app.phar")), b"ARCHIVE");
    assert!(archive.join("sass-linux-amd64.so").is_file());
    assert!(archive.join("sass-windows-amd64.dll").is_file());
    assert!(!archive.join("notes.txt").exists());

    assert_eq!(artifacts[1].kind, "archive");
    assert_eq!(artifacts[1].path, archive.join("app.phar"));
}

#[tokio::test]
async fn prepare_creates_directories_and_ignore_file() {
    let (_dir, config) = common::project();
    let fetcher = CountingFetcher::new();

    let (steps, ()) = compiler(config.clone(), &fetcher)
        .prepare()
        .collect()
        .await
        .unwrap();

    assert!(config.temp_directory().is_dir());
    assert_eq!(
        std::fs::read_to_string(config.output().join(".gitignore")).unwrap(),
        "*\n"
    );
    assert!(steps.first().unwrap().is(TaskKind::Prepare, Phase::Ready));
    assert!(steps.last().unwrap().is(TaskKind::Prepare, Phase::Completed));
}

#[tokio::test]
async fn pack_without_interpreter_fails_before_downloading() {
    let (dir, config) = common::project();
    let config = config.with_interpreter(dir.path().join("no-such-php"));
    let fetcher = CountingFetcher::new();

    let error = compiler(config.clone(), &fetcher)
        .pack()
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::ToolNotFound { .. }));
    assert_eq!(fetcher.count(), 0);
    assert!(!config.output().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn pack_and_compile_run_end_to_end() {
    let (dir, config) = common::project();
    let config = linux_amd64(config);
    let php = common::fake_interpreter(
        dir.path(),
        &format!(
            "printf 'PACKED' > '{}'",
            config.archive_path().display()
        ),
    );
    let config = config.with_interpreter(&php);
    let fetcher = CountingFetcher::new();

    let (steps, artifacts) = compiler(config.clone(), &fetcher)
        .compile(CompileOptions::default())
        .collect()
        .await
        .unwrap();

    assert_eq!(
        fetcher.uris(),
        [
            config.box_uri(),
            format!("{STUB_BASE}/linux-amd64.minimal.stub"),
        ]
    );
    assert!(config.box_path().is_file());
    assert!(config.manifest_path().is_file());
    assert!(config.loader_path().is_file());

    let kinds: Vec<_> = milestones(&steps)
        .into_iter()
        .map(|(task, phase, _)| (task, phase))
        .collect();
    assert_eq!(
        kinds,
        [
            (TaskKind::Compile, Phase::Ready),
            (TaskKind::Pack, Phase::Ready),
            (TaskKind::Pack, Phase::Completed),
            (TaskKind::Target, Phase::Ready),
            (TaskKind::Target, Phase::Completed),
            (TaskKind::Compile, Phase::Completed),
        ]
    );

    let executable = common::read(&artifacts[0].path);
    assert!(executable.ends_with(b"PACKED"));
}

#[tokio::test]
async fn dropping_the_run_stops_further_work() {
    let (_dir, config) = common::project();
    let config = config
        .with_platform(["linux", "windows"])
        .with_arch(["amd64"]);
    common::write_archive(&config, b"ARCHIVE");
    let fetcher = CountingFetcher::new();
    let compiler = compiler(config.clone(), &fetcher);

    let mut run = compiler.compile(NO_PACK);
    while let Some(step) = run.next().await {
        let step = step.unwrap();
        if step.is(TaskKind::Target, Phase::Completed) {
            break;
        }
    }
    drop(run);

    assert!(config.output().join("linux/amd64/app").is_file());
    assert!(!config.output().join("windows/amd64").exists());
    assert_eq!(fetcher.count(), 1);
}
