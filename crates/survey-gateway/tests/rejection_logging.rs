//! Each rejected submission produces a single warning-level log line

mod common;

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::Level;

use common::{config, post, router, send, FailingStore, FakeVerifier, Verdict};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_warnings() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[tokio::test]
async fn internal_error_is_logged_once() {
    let (captured, _guard) = capture_warnings();
    let router = router(
        config(),
        FakeVerifier::new(Verdict::Human),
        Arc::new(FailingStore),
    );

    let res = send(router, post(r#"{"id":"x","answers":{}}"#)).await;
    assert_eq!(res.status.as_u16(), 500);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{:#?}", lines);
    assert!(lines[0].contains("WARN"));
    assert!(lines[0].contains("submission rejected"));
    assert!(lines[0].contains("disk on fire"));
}

#[tokio::test]
async fn bad_request_is_logged_once() {
    let (captured, _guard) = capture_warnings();
    let router = router(
        config().with_private_key("site-secret"),
        FakeVerifier::new(Verdict::Bot),
        Arc::new(FailingStore),
    );

    let res = send(router, post(r#"{"captcha_token":"t","id":"x"}"#)).await;
    assert_eq!(res.status.as_u16(), 400);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{:#?}", lines);
    assert!(lines[0].contains("submission rejected"));
}
