use std::path::Path;

use {
    async_trait::async_trait,
    reelsmith_media::{Error as MediaError, FileRef, PlatformFileStore, RemoteFile, Result as MediaResult},
    teloxide::prelude::*,
    tokio::io::AsyncWriteExt,
    tracing::debug,
};

/// Telegram-hosted files, resolved with `getFile` and streamed to disk.
#[derive(Clone)]
pub struct TelegramFiles {
    bot: Bot,
    client: reqwest::Client,
}

impl TelegramFiles {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PlatformFileStore for TelegramFiles {
    async fn metadata(&self, file: &FileRef) -> MediaResult<RemoteFile> {
        let remote = self
            .bot
            .get_file(&file.id)
            .await
            .map_err(|e| MediaError::external("telegram getFile", e))?;
        // The Bot API omits file_size for some files; teloxide reads that as 0.
        let size = (remote.meta.size > 0).then_some(u64::from(remote.meta.size));
        debug!(file_id = %file.id, path = %remote.path, ?size, "resolved telegram file");
        Ok(RemoteFile {
            size,
            path: remote.path,
        })
    }

    async fn download(&self, remote: &RemoteFile, destination: &Path) -> MediaResult<()> {
        // A local Bot API server hands out absolute paths on its own disk.
        if Path::new(&remote.path).is_absolute() {
            tokio::fs::copy(&remote.path, destination)
                .await
                .map_err(|e| MediaError::external("copy local bot api file", e))?;
            return Ok(());
        }

        let url = file_url(self.bot.api_url().as_str(), self.bot.token(), &remote.path);
        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MediaError::external("download telegram file", e))?;
        if !response.status().is_success() {
            return Err(MediaError::Message(format!(
                "failed to download file: HTTP {}",
                response.status()
            )));
        }

        let mut out = tokio::fs::File::create(destination)
            .await
            .map_err(|e| MediaError::external("create download target", e))?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::external("read telegram file body", e))?
        {
            out.write_all(&chunk)
                .await
                .map_err(|e| MediaError::external("write download target", e))?;
        }
        out.flush()
            .await
            .map_err(|e| MediaError::external("flush download target", e))?;
        Ok(())
    }
}

/// `<api>/file/bot<token>/<path>`
fn file_url(api_url: &str, token: &str, path: &str) -> String {
    format!("{}/file/bot{token}/{path}", api_url.trim_end_matches('/'))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("https://api.telegram.org", "https://api.telegram.org/file/bot123:abc/videos/file_7.mp4")]
    #[case("https://api.telegram.org/", "https://api.telegram.org/file/bot123:abc/videos/file_7.mp4")]
    #[case("http://localhost:8081", "http://localhost:8081/file/bot123:abc/videos/file_7.mp4")]
    fn builds_file_download_url(#[case] api: &str, #[case] expected: &str) {
        assert_eq!(file_url(api, "123:abc", "videos/file_7.mp4"), expected);
    }

    #[tokio::test]
    async fn absolute_paths_are_copied_from_local_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("local.mp4");
        std::fs::write(&source, b"local bot api").unwrap();
        let destination = dir.path().join("copy.mp4");

        let files = TelegramFiles::new(Bot::new("123:abc"));
        let remote = RemoteFile {
            size: Some(13),
            path: source.to_string_lossy().into_owned(),
        };
        files.download(&remote, &destination).await.unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"local bot api");
    }
}
