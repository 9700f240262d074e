use futures::stream::StreamExt;
use futures::Stream;
use std::time::Duration;
use tokio::time::sleep;

pub async fn assert_no_element_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
    T: std::fmt::Debug,
{
    tokio::select! {
        item = stream.next() => {
            if let Some(item) = item {
                panic!("Unexpected element emitted, expected no output: {item:?}");
            }
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => {
        }
    }
}

/// Next item of `stream`, or `None` if nothing arrives within `timeout_ms`.
pub async fn unwrap_stream<S, T>(stream: &mut S, timeout_ms: u64) -> Option<T>
where
    S: Stream<Item = T> + Unpin,
{
    tokio::select! {
        item = stream.next() => item,
        _ = sleep(Duration::from_millis(timeout_ms)) => None,
    }
}
