//! # Printer: minimal terminal consumer
//!
//! Writes one line per record and a notice per gap.
//!
//! ## Example output
//! ```text
//! 1700000000.000000005            system_server  1234  1240 I ActivityManager: Start proc
//! --- 17 records dropped ---
//! ```

use std::io::{self, Write};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::consumers::Consume;
use crate::record::{PNAME_DISPLAY_WIDTH, Record};

/// Line printer over any writer (stdout by default).
pub struct Printer<W = io::Stdout> {
    out: Mutex<W>,
}

impl Printer<io::Stdout> {
    /// Printer writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> Printer<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the writer, consuming the printer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock();
        if let Err(err) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::debug!(error = %err, "printer write failed");
        }
    }
}

/// Formats one record the way [`Printer`] prints it.
pub fn format_line(rec: &Record) -> String {
    format!(
        "{}.{:09} {} {:>5} {:>5} {} {}: {}",
        rec.sec(),
        rec.nsec(),
        rec.process_name().display(PNAME_DISPLAY_WIDTH),
        rec.pid(),
        rec.tid(),
        rec.level().letter(),
        rec.tag(),
        rec.text()
    )
}

#[async_trait]
impl<W: Write + Send + 'static> Consume for Printer<W> {
    async fn on_record(&self, rec: &Record) {
        self.write_line(&format_line(rec));
    }

    async fn on_gap(&self, dropped: u64) {
        self.write_line(&format!("--- {dropped} records dropped ---"));
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_format_line_layout() {
        let rec = Record::new(1234, 1240)
            .with_timestamp(1_700_000_000, 5)
            .with_level(Level::Info.as_u8())
            .with_tag("ActivityManager")
            .with_text("Start proc")
            .with_process_name("system_server");

        let line = format_line(&rec);
        assert_eq!(
            line,
            format!(
                "1700000000.000000005 {:>24}  1234  1240 I ActivityManager: Start proc",
                "system_server"
            )
        );
    }

    #[tokio::test]
    async fn test_prints_records_and_gaps() {
        let printer = Printer::new(Vec::new());
        printer
            .on_record(&Record::new(1, 2).with_tag("t").with_text("hello"))
            .await;
        printer.on_gap(3).await;

        let text = String::from_utf8(printer.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("t: hello"));
        assert_eq!(lines[1], "--- 3 records dropped ---");
    }
}
