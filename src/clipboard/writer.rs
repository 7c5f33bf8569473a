//! System clipboard writes backed by the `arboard` crate.
//!
//! On X11 and Wayland the copied text is served only while an
//! [`arboard::Clipboard`] is alive, so [`SystemClipboard`] keeps one handle
//! open on a dedicated `clipboard` thread for the lifetime of the app.
//! `arboard::Clipboard` is not `Send` on all platforms; it is created on that
//! thread and never leaves it.

use std::sync::mpsc;
use std::thread;

use arboard::Clipboard;

use super::ClipboardError;

/// Something that can place plain text on a clipboard.
///
/// Calls may block; the controller runs them on the blocking thread pool.
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// A clipboard handle owned by the clipboard thread.
trait ClipboardHandle {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

impl ClipboardHandle for Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        Clipboard::set_text(self, text).map_err(|e| ClipboardError::Set(e.to_string()))
    }
}

struct WriteRequest {
    text: String,
    reply: mpsc::Sender<Result<(), ClipboardError>>,
}

/// The OS clipboard.  Dropping it stops the clipboard thread.
#[derive(Debug)]
pub struct SystemClipboard {
    requests: mpsc::Sender<WriteRequest>,
}

impl SystemClipboard {
    pub fn spawn() -> Result<Self, ClipboardError> {
        Self::spawn_with(open_clipboard)
    }

    /// Start the clipboard thread.  `open` runs on that thread, lazily, and
    /// again after a failed open.
    fn spawn_with<H, F>(mut open: F) -> Result<Self, ClipboardError>
    where
        H: ClipboardHandle + 'static,
        F: FnMut() -> Result<H, ClipboardError> + Send + 'static,
    {
        let (requests, rx) = mpsc::channel::<WriteRequest>();
        thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || {
                let mut handle: Option<H> = None;
                for WriteRequest { text, reply } in rx {
                    let _ = reply.send(write_with(&mut handle, &mut open, &text));
                }
                log::debug!("clipboard: thread stopped");
            })
            .map_err(|e| ClipboardError::Access(e.to_string()))?;
        Ok(Self { requests })
    }
}

fn write_with<H, F>(handle: &mut Option<H>, open: &mut F, text: &str) -> Result<(), ClipboardError>
where
    H: ClipboardHandle,
    F: FnMut() -> Result<H, ClipboardError>,
{
    let mut clipboard = match handle.take() {
        Some(clipboard) => clipboard,
        None => open()?,
    };
    let outcome = clipboard.set_text(text);
    *handle = Some(clipboard);
    outcome
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let (reply, outcome) = mpsc::channel();
        self.requests
            .send(WriteRequest {
                text: text.to_string(),
                reply,
            })
            .map_err(|_| ClipboardError::Closed)?;
        outcome.recv().map_err(|_| ClipboardError::Closed)?
    }
}

fn open_clipboard() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Counters {
        opens: AtomicUsize,
        drops: AtomicUsize,
        written: Mutex<Vec<String>>,
    }

    struct FakeHandle(Arc<Counters>);

    impl ClipboardHandle for FakeHandle {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.0.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn one_handle_stays_open_across_writes() {
        let counters = Arc::new(Counters::default());
        let shared = Arc::clone(&counters);
        let clipboard = SystemClipboard::spawn_with(move || {
            shared.opens.fetch_add(1, Ordering::SeqCst);
            Ok(FakeHandle(Arc::clone(&shared)))
        })
        .unwrap();

        clipboard.write_text("Buy X").unwrap();
        clipboard.write_text("⚠️ db down").unwrap();

        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 0);
        assert_eq!(
            *counters.written.lock().unwrap(),
            vec!["Buy X".to_string(), "⚠️ db down".to_string()]
        );
    }

    #[test]
    fn failed_open_is_reported_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counters = Arc::new(Counters::default());
        let (seen, shared) = (Arc::clone(&attempts), Arc::clone(&counters));
        let clipboard = SystemClipboard::spawn_with(move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClipboardError::Access("display not ready".into()))
            } else {
                Ok(FakeHandle(Arc::clone(&shared)))
            }
        })
        .unwrap();

        assert_eq!(
            clipboard.write_text("first"),
            Err(ClipboardError::Access("display not ready".into()))
        );
        clipboard.write_text("second").unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(*counters.written.lock().unwrap(), vec!["second".to_string()]);
    }

    #[test]
    fn system_clipboard_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SystemClipboard>();
    }
}
