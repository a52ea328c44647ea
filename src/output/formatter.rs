//! Console output for runs
//!
//! Progress lines, JSON lines and summaries for the command line tool.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::events::{OutputChannel, TestEvent, TestListener, TestOutput};
use crate::models::{
    ResultStatus, RunEligibility, RunSummary, TestDescriptor, TestNode, TestResult, TestSuite,
};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per finished test, plus test output
    Progress,
    /// Every event as one JSON object per line
    JsonLines,
    /// Summary only
    Quiet,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "progress" | "text" => Some(OutputFormat::Progress),
            "jsonl" | "json-lines" | "json" => Some(OutputFormat::JsonLines),
            "quiet" | "summary" => Some(OutputFormat::Quiet),
            _ => None,
        }
    }
}

/// Renders results, summaries and trees as text
#[derive(Clone, Debug)]
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn status_label(&self, status: ResultStatus) -> String {
        let label = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return label;
        }
        let color = match status {
            ResultStatus::Success => "32",
            ResultStatus::Failure | ResultStatus::Error => "31",
            ResultStatus::Cancelled | ResultStatus::NotRunnable => "35",
            ResultStatus::Skipped | ResultStatus::Ignored | ResultStatus::Inconclusive => "33",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    /// One progress line for a finished test case; the message of a
    /// failing test follows, indented
    pub fn format_result(&self, result: &TestResult) -> String {
        let mut line = format!(
            "{} {} [{}ms]",
            self.status_label(result.status),
            result.test.full_name,
            result.duration_ms
        );
        if let Some(message) = &result.message {
            for text in message.lines() {
                line.push_str("\n      ");
                line.push_str(text);
            }
        }
        line
    }

    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::json!({ "event": "summary", "data": summary }).to_string()
            }
            OutputFormat::Progress | OutputFormat::Quiet => format!("\n{summary}"),
        }
    }

    /// Indented outline of a suite tree
    pub fn format_tree(&self, suite: &TestSuite) -> String {
        let mut out = String::new();
        write_tree_line(&mut out, &suite_line(suite), 0);
        for child in suite.children() {
            format_node(&mut out, child, 1);
        }
        out
    }
}

fn suite_line(suite: &TestSuite) -> String {
    format!(
        "{} [{}, {} tests]",
        suite.info.name,
        suite.kind.name(),
        suite.test_case_count()
    )
}

fn format_node(out: &mut String, node: &TestNode, depth: usize) {
    let mut line = match node {
        TestNode::Suite(suite) => suite_line(suite),
        TestNode::Case(_) => node.name().to_string(),
    };
    let info = node.info();
    match &info.ignore_reason {
        Some(reason) => line.push_str(&format!(" ({}: {reason})", info.run_state)),
        None if info.run_state != RunEligibility::Runnable => {
            line.push_str(&format!(" ({})", info.run_state))
        }
        None => {}
    }
    write_tree_line(out, &line, depth);
    if let TestNode::Suite(suite) = node {
        for child in suite.children() {
            format_node(out, child, depth + 1);
        }
    }
}

fn write_tree_line(out: &mut String, line: &str, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(line);
    out.push('\n');
}

/// Listener printing a run as it happens
pub struct ConsoleListener<W: Write + Send = io::Stdout> {
    formatter: ResultFormatter,
    show_output: bool,
    writer: Mutex<W>,
}

impl ConsoleListener<io::Stdout> {
    pub fn stdout(formatter: ResultFormatter) -> Self {
        Self::with_writer(formatter, io::stdout())
    }
}

impl<W: Write + Send> ConsoleListener<W> {
    pub fn with_writer(formatter: ResultFormatter, writer: W) -> Self {
        Self {
            formatter,
            show_output: true,
            writer: Mutex::new(writer),
        }
    }

    pub fn show_output(mut self, show: bool) -> Self {
        self.show_output = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // a closed stdout is not worth failing the run over
        let _ = writeln!(writer, "{line}");
    }

    fn write_event(&self, event: TestEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => self.write_line(&line),
            Err(e) => tracing::warn!("Failed to serialize {} event: {}", event.kind(), e),
        }
    }
}

impl<W: Write + Send> TestListener for ConsoleListener<W> {
    fn test_started(&self, test: &TestDescriptor) {
        if self.formatter.format() == OutputFormat::JsonLines {
            self.write_event(TestEvent::Started(test.clone()));
        }
    }

    fn test_finished(&self, result: &TestResult) {
        match self.formatter.format() {
            OutputFormat::JsonLines => {
                self.write_event(TestEvent::Finished(result.without_children()));
            }
            OutputFormat::Progress => {
                // suites only show up when they failed on their own
                if !result.is_suite() || result.status.is_failure() {
                    self.write_line(&self.formatter.format_result(result));
                }
            }
            OutputFormat::Quiet => {}
        }
    }

    fn test_output(&self, output: &TestOutput) {
        match self.formatter.format() {
            OutputFormat::JsonLines => self.write_event(TestEvent::Output(output.clone())),
            OutputFormat::Progress if self.show_output => {
                let prefix = match output.channel {
                    OutputChannel::Out => "  |",
                    OutputChannel::Error => "  !",
                };
                for line in output.text.lines() {
                    self.write_line(&format!("{prefix} {line}"));
                }
            }
            _ => {}
        }
    }
}
