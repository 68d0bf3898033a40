//! ユーザー向けログの出力先

use std::fmt;

/// ユーザーに見せる行を出力順に受け取る
///
/// 各行は `tracing` の debug イベントとしても記録されます。
pub struct LogSink {
    sink: Box<dyn FnMut(&str) + Send>,
}

impl LogSink {
    pub fn new<F>(sink: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn emit(&mut self, line: &str) {
        tracing::debug!(target: "harborlift::remote", "{}", line);
        (self.sink)(line);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_lines_in_order() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let mut sink = LogSink::new(move |line| captured.lock().unwrap().push(line.to_string()));

        sink.emit("first");
        sink.emit("second");

        assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
    }
}
