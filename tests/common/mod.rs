use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use suitewalk::{Event, EventEmitter, EventKind};

/// Subscribes to every event kind and keeps a compact log of what was emitted.
///
/// Entries look like `start:A`, `test:A:x:pass`, `before:A:before[0]:fail`,
/// `test:A:y:disabled`, `multipleResolves:A:x`, `complete` and `error`.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct EventRecorder {
    entries: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<(String, String)>>>,
}

#[allow(dead_code)]
impl EventRecorder {
    pub fn attach(emitter: &EventEmitter) -> Self {
        let recorder = Self::default();
        for kind in EventKind::ALL {
            let recorder = recorder.clone();
            emitter.subscribe(kind, move |event| {
                recorder.record(event);
                Ok(())
            });
        }
        recorder
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// `(block name, error message)` for every failed completion and rejection.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }

    fn record(&self, event: &Event) {
        let entry = match event {
            Event::DescribeBlockStart { block } => {
                format!("start:{}", block.concat_name(":"))
            }
            Event::BlockComplete(completion) => {
                let status = if completion.block.disabled {
                    "disabled"
                } else if let Some(error) = &completion.error {
                    self.push_error(completion.block.concat_name(":"), error.to_string());
                    "fail"
                } else {
                    "pass"
                };
                format!(
                    "{}:{}:{}",
                    completion.block.kind,
                    completion.block.concat_name(":"),
                    status
                )
            }
            Event::MultipleResolves { block } => {
                format!("multipleResolves:{}", block.concat_name(":"))
            }
            Event::MultipleRejections { block, error } => {
                self.push_error(block.concat_name(":"), error.to_string());
                format!("multipleRejections:{}", block.concat_name(":"))
            }
            Event::Complete => "complete".to_string(),
            Event::Error { .. } => "error".to_string(),
        };
        self.entries.lock().unwrap().push(entry);
    }

    fn push_error(&self, name: String, message: String) {
        self.errors.lock().unwrap().push((name, message));
    }
}

/// A cloneable in-memory writer for capturing reporter output.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
