//! Bridge - completion callback を future に変換
//!
//! downloader の completion を `oneshot` に包み、呼び出し側をちょうど 1 回だけ再開させます。
//! 2 回目以降の呼び出しは捨てます（warn ログのみ）。
//! completion が呼ばれずに drop された場合は `CompletionDropped` になります。

use tokio::sync::oneshot;
use tracing::warn;
use url::Url;

use crate::domain::{BoxError, CompletionDropped};
use crate::ports::{Completion, DownloadOptions, DownloadResult, Downloader};

/// Build a completion that forwards only its first result into the returned receiver.
pub fn completion_channel<T, E>() -> (Completion<T, E>, oneshot::Receiver<Result<T, E>>)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    let completion: Completion<T, E> = Box::new(move |result: Result<T, E>| match tx.take() {
        Some(tx) => {
            // receiver がいない = 呼び出し側の future が drop 済み
            let _ = tx.send(result);
        }
        None => warn!("download completion invoked more than once; ignoring"),
    });
    (completion, rx)
}

/// Start a download and wait for its single completion.
pub async fn download<D>(
    downloader: &D,
    url: &Url,
    options: &DownloadOptions,
) -> Result<DownloadResult<D::Image>, BoxError>
where
    D: Downloader + ?Sized,
{
    let (completion, rx) = completion_channel();
    downloader.download(url, options, completion);

    match rx.await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(Box::new(err)),
        Err(_) => Err(Box::new(CompletionDropped {
            url: url.to_string(),
        })),
    }
}
