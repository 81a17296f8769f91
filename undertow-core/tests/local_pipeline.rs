//! Local-assets pipeline tests against real files in a scratch directory

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use undertow_core::config::{AssetSource, ConfigError, UndertowConfig};
use undertow_core::torrent::{MetaInfo, PUBLIC_TRACKERS};
use undertow_core::{UndertowError, run_local};

fn write_file(dir: &Path, relative: &str, contents: &[u8]) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn release_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "dist/widget.zip", b"zip archive contents");
    write_file(dir.path(), "dist/widget.tar.gz", b"tarball contents");
    write_file(dir.path(), "docs/manual.pdf", b"manual contents");
    dir
}

fn local_config(dir: &TempDir, patterns: &[&str], single_torrent: bool) -> UndertowConfig {
    let mut config = UndertowConfig::default();
    config.source = AssetSource::Local;
    config.github.repository = Some("acme/widget".to_string());
    config.local.patterns = patterns.iter().map(|p| p.to_string()).collect();
    config.local.tag_ref = Some("refs/tags/v1.2.3".to_string());
    config.local.single_torrent = single_torrent;
    config.local.base_dir = dir.path().to_path_buf();
    config.output.dir = dir.path().join("torrents");
    config
}

fn read_torrent(path: &Path) -> MetaInfo {
    MetaInfo::from_bytes(&std::fs::read(path).unwrap()).unwrap()
}

fn torrent_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_per_file_torrents_with_predicted_web_seeds() {
    let dir = release_fixture();
    let config = local_config(&dir, &["dist/*", "docs/*.pdf"], false);

    let summary = run_local(&config).await.unwrap();

    assert_eq!(summary.torrents.len(), 3);
    assert_eq!(summary.uploads, 0);
    assert_eq!(
        torrent_names(&config.output.dir),
        vec![
            "manual.pdf-v1.2.3.torrent",
            "widget.tar.gz-v1.2.3.torrent",
            "widget.zip-v1.2.3.torrent",
        ]
    );

    let zip = read_torrent(&config.output.dir.join("widget.zip-v1.2.3.torrent"));
    assert_eq!(
        zip.url_list,
        vec!["https://github.com/acme/widget/releases/download/v1.2.3/widget.zip"]
    );
    assert_eq!(zip.info.name, "widget.zip");
    assert_eq!(zip.info.length, Some(b"zip archive contents".len() as u64));
    assert_eq!(zip.announce_list.len(), 1);
    assert_eq!(zip.announce_list[0].len(), PUBLIC_TRACKERS.len());

    for torrent in &summary.torrents {
        assert_eq!(read_torrent(torrent).url_list.len(), 1);
    }
}

#[tokio::test]
async fn test_per_file_overlapping_patterns_create_one_torrent_per_file() {
    let dir = release_fixture();
    let config = local_config(&dir, &["dist/*.zip", "dist/*"], false);

    let summary = run_local(&config).await.unwrap();

    assert_eq!(summary.torrents.len(), 2);
    assert_eq!(
        torrent_names(&config.output.dir),
        vec!["widget.tar.gz-v1.2.3.torrent", "widget.zip-v1.2.3.torrent"]
    );
}

#[tokio::test]
async fn test_single_combined_torrent() {
    let dir = release_fixture();
    let config = local_config(&dir, &["dist/*.zip", "docs/*", "dist/*.gz"], true);

    let summary = run_local(&config).await.unwrap();

    assert_eq!(
        summary.torrents,
        vec![config.output.dir.join("widget-v1.2.3.torrent")]
    );
    assert_eq!(torrent_names(&config.output.dir), vec!["widget-v1.2.3.torrent"]);

    let torrent = read_torrent(&summary.torrents[0]);
    let base = "https://github.com/acme/widget/releases/download/v1.2.3";
    assert_eq!(
        torrent.url_list,
        vec![
            format!("{base}/widget.zip"),
            format!("{base}/manual.pdf"),
            format!("{base}/widget.tar.gz"),
        ]
    );
    assert_eq!(torrent.info.name, "widget-v1.2.3");
    let files = torrent.info.files.unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0].path, vec!["dist", "widget.zip"]);
    assert_eq!(files[1].path, vec!["docs", "manual.pdf"]);
}

#[tokio::test]
async fn test_combined_torrent_keeps_duplicate_matches() {
    let dir = release_fixture();
    let config = local_config(&dir, &["dist/*.zip", "dist/widget.zip"], true);

    let summary = run_local(&config).await.unwrap();

    let torrent = read_torrent(&summary.torrents[0]);
    assert_eq!(torrent.url_list.len(), 2);
    assert_eq!(torrent.info.files.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unmatched_pattern_aborts_remaining_patterns() {
    let dir = release_fixture();
    let config = local_config(&dir, &["dist/*.zip", "build/*.bin", "docs/*.pdf"], false);

    let error = run_local(&config).await.unwrap_err();

    match &error {
        UndertowError::NoMatches { pattern } => assert_eq!(pattern, "build/*.bin"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("build/*.bin"));
    // Output from the pattern before the failing one stays on disk
    assert_eq!(
        torrent_names(&config.output.dir),
        vec!["widget.zip-v1.2.3.torrent"]
    );
}

#[tokio::test]
async fn test_hidden_files_not_seeded() {
    let dir = release_fixture();
    write_file(dir.path(), "dist/.DS_Store", b"finder metadata");
    write_file(dir.path(), "dist/.cache/old.zip", b"stale build");
    let config = local_config(&dir, &["dist/*", "dist/**/*.zip"], false);

    let summary = run_local(&config).await.unwrap();

    assert_eq!(summary.torrents.len(), 2);
    assert_eq!(
        torrent_names(&config.output.dir),
        vec!["widget.tar.gz-v1.2.3.torrent", "widget.zip-v1.2.3.torrent"]
    );
}

#[tokio::test]
async fn test_combined_mode_tolerates_unmatched_pattern() {
    let dir = release_fixture();
    let config = local_config(&dir, &["build/*.bin", "dist/*.zip"], true);

    let summary = run_local(&config).await.unwrap();

    assert_eq!(
        summary.torrents,
        vec![config.output.dir.join("widget-v1.2.3.torrent")]
    );
    let torrent = read_torrent(&summary.torrents[0]);
    assert_eq!(
        torrent.url_list,
        vec!["https://github.com/acme/widget/releases/download/v1.2.3/widget.zip"]
    );
    assert_eq!(torrent.info.name, "widget.zip");
}

#[tokio::test]
async fn test_combined_mode_with_no_matches_fails() {
    let dir = release_fixture();
    let config = local_config(&dir, &["build/*.bin"], true);

    let error = run_local(&config).await.unwrap_err();
    assert!(matches!(error, UndertowError::NoMatches { .. }));
}

#[tokio::test]
async fn test_empty_pattern_list_fails_before_touching_disk() {
    let dir = release_fixture();
    let config = local_config(&dir, &[], false);

    let error = run_local(&config).await.unwrap_err();

    assert!(matches!(
        error,
        UndertowError::Config(ConfigError::NoPatterns)
    ));
    assert!(!config.output.dir.exists());
}

#[tokio::test]
async fn test_missing_tag_fails_before_touching_disk() {
    let dir = release_fixture();
    let mut config = local_config(&dir, &["dist/*"], false);
    config.local.tag_ref = None;

    let error = run_local(&config).await.unwrap_err();

    assert!(matches!(
        error,
        UndertowError::Config(ConfigError::MissingTag)
    ));
    assert!(!config.output.dir.exists());
}

#[tokio::test]
async fn test_custom_server_url_and_piece_length() {
    let dir = release_fixture();
    let mut config = local_config(&dir, &["docs/manual.pdf"], false);
    config.github.server_url = "https://ghe.example.com/".to_string();
    config.output.piece_length = Some(32_768);

    let summary = run_local(&config).await.unwrap();

    let torrent = read_torrent(&summary.torrents[0]);
    assert_eq!(
        torrent.url_list,
        vec!["https://ghe.example.com/acme/widget/releases/download/v1.2.3/manual.pdf"]
    );
    assert_eq!(torrent.info.piece_length, 32_768);
    let expected: PathBuf = config.output.dir.join("manual.pdf-v1.2.3.torrent");
    assert_eq!(summary.torrents, vec![expected]);
}
