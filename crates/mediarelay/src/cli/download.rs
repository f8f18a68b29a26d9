//! Saving finished artifacts to disk.
//!
//! Remote URLs are streamed to the file; inline `data:` URLs are decoded.

use base64::Engine;
use mediarelay_core::{ArtifactKind, JobOutcome};
use std::path::{Path, PathBuf};

/// Save the artifact of a completed outcome into `dir`.
///
/// Returns `None` when the outcome carries no artifact.
pub async fn save_artifact(
    client: &reqwest::Client,
    outcome: &JobOutcome,
    dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    let Some(artifact) = outcome.artifact() else {
        return Ok(None);
    };
    let kind = if outcome.video_url.is_some() {
        ArtifactKind::Video
    } else {
        ArtifactKind::Image
    };

    let dir = expand_dir(dir);
    let dir = dir.as_path();
    tokio::fs::create_dir_all(dir).await?;

    let dest = if let Some((media_type, data)) = parse_data_url(artifact) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| anyhow::anyhow!("Inline artifact is not valid base64: {e}"))?;
        let dest = dir.join(file_name(outcome, extension_for(media_type, kind)));
        tokio::fs::write(&dest, bytes).await?;
        dest
    } else {
        let ext = url_extension(artifact).unwrap_or_else(|| default_extension(kind));
        let dest = dir.join(file_name(outcome, ext));
        download_file(client, artifact, &dest).await?;
        dest
    };

    tracing::info!("Saved artifact to {}", dest.display());
    Ok(Some(dest))
}

async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    if let Some(size) = response.content_length() {
        tracing::debug!("Downloading {:.1} MB from {url}", size as f64 / (1024.0 * 1024.0));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    Ok(())
}

/// Expand a leading `~` in a user-supplied directory.
fn expand_dir(dir: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned())
}

/// Split `data:<mime>;base64,<data>` into its media type and payload.
fn parse_data_url(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    Some((media_type, data))
}

fn extension_for(media_type: &str, kind: ArtifactKind) -> &'static str {
    match media_type.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => default_extension(kind),
    }
}

fn default_extension(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Image => "png",
        ArtifactKind::Video => "mp4",
    }
}

/// Known media extension at the end of a URL path, ignoring any query.
fn url_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next()?;
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "mp4" => Some("mp4"),
        "webm" => Some("webm"),
        "mov" => Some("mov"),
        _ => None,
    }
}

/// `<source stem>-<task id>.<ext>`, with whichever parts are known.
fn file_name(outcome: &JobOutcome, ext: &str) -> String {
    let stem = outcome
        .source
        .as_deref()
        .and_then(|s| Path::new(s).file_stem())
        .and_then(|s| s.to_str());
    let task = outcome.task_id.as_deref();

    let base = match (stem, task) {
        (Some(stem), Some(task)) => format!("{stem}-{task}"),
        (Some(name), None) | (None, Some(name)) => name.to_string(),
        (None, None) => "artifact".to_string(),
    };
    let base: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{base}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediarelay_core::job::ResultPayload;

    fn outcome(artifact: &str, kind: ArtifactKind) -> JobOutcome {
        JobOutcome::completed(&ResultPayload::from_value(artifact), kind)
    }

    #[test]
    fn parse_data_url_splits_header() {
        assert_eq!(
            parse_data_url("data:image/png;base64,aGVsbG8="),
            Some(("image/png", "aGVsbG8="))
        );
        assert_eq!(parse_data_url("https://x/a.png"), None);
        assert_eq!(parse_data_url("data:text/plain,hello"), None);
    }

    #[test]
    fn expand_dir_leaves_plain_paths() {
        assert_eq!(expand_dir(Path::new("./out")), PathBuf::from("./out"));
    }

    #[test]
    fn url_extension_ignores_query() {
        assert_eq!(url_extension("https://cdn.x/out.MP4?sig=abc"), Some("mp4"));
        assert_eq!(url_extension("https://cdn.x/out.jpeg#frag"), Some("jpg"));
        assert_eq!(url_extension("https://cdn.x/download"), None);
    }

    #[test]
    fn extension_falls_back_to_kind() {
        assert_eq!(extension_for("image/webp", ArtifactKind::Image), "webp");
        assert_eq!(extension_for("application/octet-stream", ArtifactKind::Video), "mp4");
    }

    #[test]
    fn file_name_uses_source_and_task() {
        let o = outcome("https://x/a.png", ArtifactKind::Image)
            .with_source("./photos/shoe.jpg")
            .with_task_id("t/1");
        assert_eq!(file_name(&o, "png"), "shoe-t_1.png");

        let bare = outcome("https://x/a.png", ArtifactKind::Image);
        assert_eq!(file_name(&bare, "png"), "artifact.png");
    }

    #[tokio::test]
    async fn save_inline_artifact_decodes_base64() {
        let dir = tempfile::tempdir().unwrap();
        let o = outcome("data:image/png;base64,aGVsbG8=", ArtifactKind::Image).with_task_id("t1");

        let path = save_artifact(&reqwest::Client::new(), &o, dir.path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("t1.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn save_without_artifact_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let failed = JobOutcome::failed(&mediarelay_core::JobError::NoResult);
        let saved = save_artifact(&reqwest::Client::new(), &failed, dir.path())
            .await
            .unwrap();
        assert!(saved.is_none());
    }
}
