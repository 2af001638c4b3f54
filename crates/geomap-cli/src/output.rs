//! Terminal output
//!
//! Human output goes to stdout with status marks; errors and warnings go to
//! stderr. JSON mode prints one document per command on stdout and keeps
//! human chatter out of it.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// A labelled value, aligned in human output
    fn field(&self, label: &str, value: &str);
    /// One checklist row; `position` is 1-based
    fn checklist_row(&self, position: usize, completed: bool, title: &str);
    fn print_json(&self, value: &Value);
}

const MARK_OK: char = '\u{2713}';
const MARK_ERR: char = '\u{2717}';
const MARK_WARN: char = '\u{26a0}';

/// Status marks and two-space indentation; `quiet` keeps only errors and
/// warnings
pub struct HumanFormatter {
    quiet: bool,
}

impl HumanFormatter {
    fn say(&self, line: std::fmt::Arguments<'_>) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        self.say(format_args!("{MARK_OK} {message}"));
    }

    fn error(&self, message: &str) {
        eprintln!("{MARK_ERR} Error: {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("{MARK_WARN} Warning: {message}");
    }

    fn info(&self, message: &str) {
        self.say(format_args!("  {message}"));
    }

    fn field(&self, label: &str, value: &str) {
        let label = format!("{label}:");
        self.say(format_args!("  {label:<14} {value}"));
    }

    fn checklist_row(&self, position: usize, completed: bool, title: &str) {
        let mark = if completed { 'x' } else { ' ' };
        self.say(format_args!("  {position:>2}. [{mark}] {title}"));
    }

    fn print_json(&self, _value: &Value) {}
}

/// Machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", serde_json::json!({ "success": true, "message": message }));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "success": false, "error": message }));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "level": "warning", "message": message }));
    }

    fn info(&self, _message: &str) {}

    fn field(&self, _label: &str, _value: &str) {}

    // Commands print the whole list as one document instead
    fn checklist_row(&self, _position: usize, _completed: bool, _title: &str) {}

    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("{}", serde_json::json!({ "success": false, "error": e.to_string() })),
        }
    }
}

pub fn get_formatter(format: OutputFormat, quiet: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter { quiet }),
    }
}
