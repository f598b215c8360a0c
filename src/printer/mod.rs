//! Printers: coloured headers and port summaries (owo-colors).

use owo_colors::OwoColorize;
use run_outputs::output::PortView;

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    /// Printer for a configured colour name; `None` when colour is disabled.
    pub fn new(color: Option<&str>) -> Self {
        let color = match color.map(|c| c.to_ascii_lowercase()).as_deref() {
            Some("green") => Some("green"),
            Some("cyan") => Some("cyan"),
            Some("magenta") => Some("magenta"),
            Some("yellow") => Some("yellow"),
            Some("red") => Some("red"),
            _ => None,
        };
        Self { color }
    }

    pub fn paint(&self, text: &str) -> String {
        match self.color {
            Some("green") => text.green().to_string(),
            Some("cyan") => text.cyan().to_string(),
            Some("magenta") => text.magenta().to_string(),
            Some("yellow") => text.yellow().to_string(),
            Some("red") => text.red().to_string(),
            _ => text.to_string(),
        }
    }

    pub fn print(&self, text: &str) {
        println!("{}", self.paint(text));
    }

    /// One line per port: name, depth, total declared size and error flag.
    pub fn print_port_summary(&self, port: &PortView) {
        let status = if port.is_error() { "error" } else { "ok" };
        println!(
            "{}\tdepth {}\t{} bytes\t{}",
            self.paint(port.name()),
            port.depth(),
            port.total_data_size(),
            status
        );
    }
}
