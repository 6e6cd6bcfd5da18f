use std::time::Duration;

use crate::Context;

/// Background refresh loop: wake up on a fixed interval and refresh every
/// channel. Failures are logged and the loop always survives to the next
/// tick.
pub(super) async fn run(context: Context, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        tracing::info!("starting scheduled refresh of all channels");
        if let Err(err) = super::refresh_all(&context).await {
            tracing::error!("scheduled refresh failed: {}", err);
        }
        tracing::info!("finished scheduled refresh");
    }
}
