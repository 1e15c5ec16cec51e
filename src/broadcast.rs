//! Broadcast engine
//!
//! Delivers rendered lines to one or all sessions. Every enqueue is
//! non-blocking: a recipient whose outbox is full simply misses the line.
//! These functions run under the server lock, so they never log; drops are
//! reported back to the caller to log once the lock is released.

use std::sync::Arc;

use crate::error::SendError;
use crate::registry::Registry;

/// Outcome of a fan-out
#[derive(Debug, Default)]
pub struct Fanout {
    /// Number of sessions the line was queued for
    pub delivered: usize,
    /// Recipients that missed the line, and why
    pub dropped: Vec<(String, SendError)>,
}

/// Enqueue `line` for the session named `name`
///
/// Returns false if the recipient is gone or its outbox is full.
pub fn send_to(registry: &Registry, name: &str, line: &Arc<str>) -> bool {
    registry
        .lookup(name)
        .is_some_and(|session| session.deliver(Arc::clone(line)).is_ok())
}

/// Enqueue `line` for every session except `exclude`
pub fn broadcast_all(registry: &Registry, line: &Arc<str>, exclude: Option<&str>) -> Fanout {
    let mut fanout = Fanout::default();
    for session in registry.sessions() {
        if exclude == Some(session.name()) {
            continue;
        }
        match session.deliver(Arc::clone(line)) {
            Ok(()) => fanout.delivered += 1,
            Err(e) => fanout.dropped.push((session.name().to_string(), e)),
        }
    }
    fanout
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn line(text: &str) -> Arc<str> {
        Arc::from(text)
    }

    #[tokio::test]
    async fn test_send_to_unknown() {
        let registry = Registry::new(10, 10);
        assert!(!send_to(&registry, "ghost", &line("hi")));
    }

    #[tokio::test]
    async fn test_send_to_named() {
        let mut registry = Registry::new(10, 10);
        let mut alice = registry.register("alice").unwrap();
        let mut bob = registry.register("bob").unwrap();

        assert!(send_to(&registry, "alice", &line("psst")));

        assert_eq!(&*alice.outbox.recv().await.unwrap(), "psst");
        assert!(bob.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_excludes() {
        let mut registry = Registry::new(10, 10);
        let mut alice = registry.register("alice").unwrap();
        let mut bob = registry.register("bob").unwrap();

        assert_eq!(broadcast_all(&registry, &line("hello"), Some("alice")).delivered, 1);

        assert_eq!(&*bob.outbox.recv().await.unwrap(), "hello");
        assert!(alice.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_outbox_does_not_block_others() {
        let mut registry = Registry::new(10, 3);
        let mut stalled = registry.register("stalled").unwrap();
        let mut live = registry.register("live").unwrap();

        for i in 0..3 {
            assert!(send_to(&registry, "stalled", &line(&format!("backlog {}", i))));
        }
        assert!(!send_to(&registry, "stalled", &line("overflow")));

        let fanout = broadcast_all(&registry, &line("news"), None);
        assert_eq!(fanout.delivered, 1);
        assert_eq!(fanout.dropped, vec![("stalled".to_string(), SendError::QueueFull)]);

        let got = timeout(Duration::from_millis(100), live.outbox.recv())
            .await
            .expect("live recipient must not wait on the stalled one")
            .unwrap();
        assert_eq!(&*got, "news");

        // The stalled recipient still holds exactly its first three lines
        for i in 0..3 {
            assert_eq!(&*stalled.outbox.recv().await.unwrap(), format!("backlog {}", i).as_str());
        }
        assert!(stalled.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_writer() {
        let mut registry = Registry::new(10, 10);
        let gone = registry.register("gone").unwrap();
        let mut here = registry.register("here").unwrap();
        drop(gone.outbox);

        let fanout = broadcast_all(&registry, &line("still here"), None);
        assert_eq!(fanout.delivered, 1);
        assert_eq!(fanout.dropped, vec![("gone".to_string(), SendError::ChannelClosed)]);
        assert_eq!(&*here.outbox.recv().await.unwrap(), "still here");
    }
}
