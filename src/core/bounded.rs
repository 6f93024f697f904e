use crate::utils::error::{QrError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Drains `body` into memory, refusing to hold `limit` bytes or more.
///
/// Reaching `limit` before end-of-stream is [`QrError::TooLarge`], whether or
/// not more data would follow. A declared `Content-Length` is never trusted.
pub async fn read_bounded<S, E>(body: S, limit: usize) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(body);

    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| QrError::transport("body read error", e))?;
        let room = limit - buf.len();
        if chunk.len() >= room {
            return Err(QrError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: Vec<Vec<u8>>) -> impl Stream<Item = std::result::Result<Bytes, String>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    #[tokio::test]
    async fn test_exactly_limit_is_too_large() {
        let err = read_bounded(chunks(vec![vec![7u8; 16]]), 16).await.unwrap_err();
        assert!(matches!(err, QrError::TooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn test_limit_reached_across_chunks() {
        let err = read_bounded(chunks(vec![vec![1u8; 10], vec![2u8; 6], vec![3u8; 1]]), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, QrError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_one_below_limit_succeeds() {
        let body = read_bounded(chunks(vec![vec![1u8; 10], vec![2u8; 5]]), 16)
            .await
            .unwrap();
        assert_eq!(body.len(), 15);
        assert_eq!(&body[..10], &[1u8; 10]);
        assert_eq!(&body[10..], &[2u8; 5]);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let body = read_bounded(chunks(vec![]), 16).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_is_transport() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err("connection reset".to_string()),
        ]);
        let err = read_bounded(body, 16).await.unwrap_err();
        assert_eq!(err.to_string(), "body read error: connection reset");
    }
}
