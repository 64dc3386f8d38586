//! Pipeline and batch behaviour against a recording runner

use crate::support::{RecordingProgress, RecordingRunner};
use cache_dance::cache::{CacheMap, CacheSource, ResolvedOptions};
use cache_dance::extract::{
    extract_caches, BatchOutcome, ExtractSettings, Extractor, Stage, BUILDSTAMP_NAME,
    DANCEFILE_NAME,
};
use cache_dance::orchestration::{ContainerEngine, SudoMode};
use cache_dance::DanceError;
use std::path::Path;
use tempfile::TempDir;

fn resolved(workdir: &Path, cache_map: &str) -> ResolvedOptions {
    ResolvedOptions {
        cache_map: CacheMap::from_json(cache_map).unwrap(),
        scratch_dir: workdir.join("scratch"),
        utility_image: "busybox:1.36".to_string(),
        builder: None,
        skip_extraction: false,
        engine: "docker".to_string(),
        workdir: workdir.to_path_buf(),
        sudo: SudoMode::Never,
    }
}

fn read_tree(dir: &Path) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(dir).unwrap().display().to_string();
                out.push((rel, std::fs::read_to_string(&path).unwrap()));
            }
        }
    }
    out.sort();
    out
}

#[tokio::test]
async fn single_source_end_to_end() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new().with_payload(
        "cache-npm",
        vec![("index.json", "{}"), ("_cacache/blob", "data")],
    );
    let progress = RecordingProgress::default();

    let outcome = extract_caches(&options, &runner, &progress).await.unwrap();
    assert_eq!(outcome, BatchOutcome::Extracted(1));

    let scratch = temp.path().join("scratch");
    let dancefile = std::fs::read_to_string(scratch.join(DANCEFILE_NAME)).unwrap();
    assert!(dancefile.contains("FROM busybox:1.36"));
    assert!(dancefile.contains("--mount=type=cache,target=/root/.npm"));
    assert!(scratch.join(BUILDSTAMP_NAME).is_file());

    let calls = runner.calls();
    let dancefile_path = scratch.join(DANCEFILE_NAME);
    let dest = temp.path().join("cache-npm");
    assert_eq!(
        calls,
        vec![
            format!(
                "docker buildx build -f {} --tag dance:extract --load {}",
                dancefile_path.display(),
                scratch.display()
            ),
            "docker rm -f cache-container".to_string(),
            "docker create -ti --name cache-container dance:extract".to_string(),
            format!(
                "docker cp -L cache-container:/var/dance-cache - | tar -H posix -x -C {}",
                scratch.display()
            ),
            format!("rm -rf {}", dest.display()),
        ]
    );

    assert_eq!(
        read_tree(&dest),
        vec![
            ("_cacache/blob".to_string(), "data".to_string()),
            ("index.json".to_string(), "{}".to_string()),
        ]
    );
    assert!(!scratch.join("dance-cache").join("cache-npm").exists());

    assert_eq!(
        progress.stages_for("cache-npm"),
        vec![
            Stage::Stamp,
            Stage::Generate,
            Stage::Build,
            Stage::ResetContainer,
            Stage::Materialize,
            Stage::Extract,
            Stage::Relocate,
            Stage::Done,
        ]
    );
    let extract_details = progress.details(Stage::Extract);
    assert!(extract_details
        .iter()
        .any(|d| d == "extracted files: [_cacache, index.json]"));
}

#[tokio::test]
async fn builder_is_passed_to_build() {
    let temp = TempDir::new().unwrap();
    let mut options = resolved(temp.path(), r#"{"cache-go": "/go/pkg/mod"}"#);
    options.builder = Some("ci-builder".to_string());
    let runner = RecordingRunner::new().with_payload("cache-go", vec![("x", "1")]);

    extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();

    assert!(runner.calls()[0].starts_with("docker buildx build --builder ci-builder -f "));
}

#[tokio::test]
async fn sources_run_strictly_in_order() {
    let temp = TempDir::new().unwrap();
    let options = resolved(
        temp.path(),
        r#"{"cache-b": "/b", "cache-a": {"target": "/a", "id": "a"}}"#,
    );
    let runner = RecordingRunner::new()
        .with_payload("cache-b", vec![("b.txt", "b")])
        .with_payload("cache-a", vec![("a.txt", "a")]);

    let outcome = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();
    assert_eq!(outcome, BatchOutcome::Extracted(2));

    let calls = runner.calls();
    assert_eq!(calls.len(), 10);
    let first_relocate = calls
        .iter()
        .position(|c| c.ends_with("cache-b"))
        .unwrap();
    let second_build = calls
        .iter()
        .rposition(|c| c.contains("buildx build"))
        .unwrap();
    assert!(first_relocate < second_build);
    assert_eq!(first_relocate, 4);
    assert_eq!(second_build, 5);

    assert_eq!(read_tree(&temp.path().join("cache-b")), vec![("b.txt".to_string(), "b".to_string())]);
    assert_eq!(read_tree(&temp.path().join("cache-a")), vec![("a.txt".to_string(), "a".to_string())]);
}

#[tokio::test]
async fn skip_extraction_has_no_side_effects() {
    let temp = TempDir::new().unwrap();
    let mut options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    options.skip_extraction = true;
    let runner = RecordingRunner::new();
    let progress = RecordingProgress::default();

    let outcome = extract_caches(&options, &runner, &progress).await.unwrap();

    assert_eq!(outcome, BatchOutcome::Skipped);
    assert!(runner.calls().is_empty());
    assert!(progress.events.lock().unwrap().is_empty());
    assert!(!temp.path().join("scratch").exists());
}

#[tokio::test]
async fn build_failure_aborts_remaining_sources() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-a": "/a", "cache-b": "/b"}"#);
    let runner = RecordingRunner::new().failing_on("buildx build", "mount path does not exist");

    let err = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DanceError::CommandExecution { ref stderr, .. } if stderr.contains("mount path")));
    assert_eq!(runner.calls().len(), 1);
    assert!(!temp.path().join("cache-a").exists());
    assert!(!temp.path().join("cache-b").exists());
}

#[tokio::test]
async fn relocation_failure_aborts_remaining_sources() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-a": "/a", "cache-b": "/b"}"#);
    let runner = RecordingRunner::new()
        .with_payload("cache-a", vec![("a.txt", "a")])
        .failing_on("rm -rf", "rm: cannot remove: Operation not permitted");

    let err = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DanceError::CommandExecution { ref stderr, .. } if stderr.contains("not permitted")));
    let calls = runner.calls();
    assert_eq!(calls.iter().filter(|c| c.contains("buildx build")).count(), 1);
    assert!(calls.last().unwrap().starts_with("rm -rf"));
    assert!(!temp.path().join("cache-a").exists());
    assert!(!temp.path().join("cache-b").exists());
    assert_eq!(
        read_tree(&temp.path().join("scratch").join("dance-cache").join("cache-a")),
        vec![("a.txt".to_string(), "a".to_string())]
    );
}

#[tokio::test]
async fn unreadable_staging_area_fails_before_copy() {
    let temp = TempDir::new().unwrap();
    let scratch = temp.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    // A file where the staging directory should be makes the stale check error out
    std::fs::write(scratch.join("dance-cache"), "not a directory").unwrap();

    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new();

    let err = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DanceError::Io { .. }));
    assert!(!runner.calls().iter().any(|c| c.contains("docker cp")));
}

#[tokio::test]
async fn missing_container_is_ignored() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new()
        .with_payload("cache-npm", vec![("f", "1")])
        .failing_on(
            "rm -f cache-container",
            "Error response from daemon: No such container: cache-container",
        );

    extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();

    assert!(runner.calls().iter().any(|c| c.contains("docker create")));
    assert!(temp.path().join("cache-npm").join("f").is_file());
}

#[tokio::test]
async fn other_container_removal_failures_are_ignored() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new()
        .with_payload("cache-npm", vec![("f", "1")])
        .failing_on("rm -f cache-container", "permission denied");

    extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();

    assert!(runner.calls().iter().any(|c| c.contains("docker create")));
}

#[tokio::test]
async fn create_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new().failing_on("docker create", "name already in use");

    let err = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DanceError::CommandExecution { .. }));
    assert!(!runner.calls().iter().any(|c| c.contains("docker cp")));
}

#[tokio::test]
async fn pipe_failure_keeps_previous_destination() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("cache-npm");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("old"), "previous run").unwrap();

    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new().failing_producer();

    let err = extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DanceError::PipeFailed(_)));
    assert!(!runner.calls().iter().any(|c| c.starts_with("rm -rf")));
    assert_eq!(std::fs::read_to_string(dest.join("old")).unwrap(), "previous run");
}

#[tokio::test]
async fn relocation_replaces_existing_directory() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("cache-npm");
    std::fs::create_dir_all(dest.join("stale-dir")).unwrap();
    std::fs::write(dest.join("stale"), "old").unwrap();

    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new().with_payload("cache-npm", vec![("fresh", "new")]);

    extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();

    assert_eq!(read_tree(&dest), vec![("fresh".to_string(), "new".to_string())]);
    assert!(!dest.join("stale-dir").exists());
}

#[tokio::test]
async fn stale_staging_dir_is_not_merged() {
    let temp = TempDir::new().unwrap();
    let staged = temp.path().join("scratch").join("dance-cache").join("cache-npm");
    std::fs::create_dir_all(&staged).unwrap();
    std::fs::write(staged.join("leftover"), "aborted run").unwrap();

    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let runner = RecordingRunner::new().with_payload("cache-npm", vec![("fresh", "new")]);

    extract_caches(&options, &runner, &RecordingProgress::default())
        .await
        .unwrap();

    assert_eq!(
        read_tree(&temp.path().join("cache-npm")),
        vec![("fresh".to_string(), "new".to_string())]
    );
}

#[tokio::test]
async fn repeated_extraction_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let options = resolved(temp.path(), r#"{"cache-npm": "/root/.npm"}"#);
    let files = vec![("a", "1"), ("nested/b", "2")];
    let runner = RecordingRunner::new()
        .with_payload("cache-npm", files.clone())
        .with_payload("cache-npm", files);
    let progress = RecordingProgress::default();

    extract_caches(&options, &runner, &progress).await.unwrap();
    let first = read_tree(&temp.path().join("cache-npm"));

    extract_caches(&options, &runner, &progress).await.unwrap();
    let second = read_tree(&temp.path().join("cache-npm"));

    assert_eq!(first, second);

    // A fresh stamp is written on every run
    let stamps = progress.details(Stage::Stamp);
    assert_eq!(stamps.len(), 2);
}

#[tokio::test]
async fn extractor_paths() {
    let runner = RecordingRunner::new();
    let progress = RecordingProgress::default();
    let extractor = Extractor::new(
        &runner,
        &progress,
        ContainerEngine::new("docker"),
        ExtractSettings {
            scratch_dir: "/s".into(),
            workdir: "/w".into(),
            utility_image: "img".to_string(),
            builder: None,
            sudo: true,
        },
    );
    let source: CacheSource = "cache-npm".parse().unwrap();

    assert_eq!(
        extractor.staged_path(&source),
        Path::new("/s/dance-cache/cache-npm")
    );
    assert_eq!(extractor.destination(&source), Path::new("/w/cache-npm"));
}
