//! JSON output formatting.
//!
//! API responses are printed as pretty JSON, colorized when the resolved
//! color mode allows it. Bodies that are not valid JSON pass through
//! untouched.

use std::io::IsTerminal;

use colored::Colorize;
use serde_json::Value;

use crate::config::ColorMode;

/// Indentation per nesting level, matching serde_json's pretty printer.
const INDENT: &str = "  ";

/// Apply the resolved color mode to the global `colored` switch. `always`
/// must survive piped output, `never` must win even on a terminal.
pub fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // https://no-color.org/
            std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
        }
    }
}

/// Pretty-print (and optionally colorize) a response body.
pub fn render_json(body: &str, mode: ColorMode) -> String {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };

    if should_color(mode) {
        let mut out = String::new();
        colorize_value(&value, 0, &mut out);
        out
    } else {
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
    }
}

/// Print a response body to stdout.
pub fn print_json(body: &str, mode: ColorMode) {
    println!("{}", render_json(body, mode));
}

fn colorize_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str(&"null".magenta().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => {
            let quoted = serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"));
            out.push_str(&quoted.green().to_string());
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&INDENT.repeat(depth + 1));
                colorize_value(item, depth + 1, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&INDENT.repeat(depth + 1));
                let quoted = serde_json::to_string(key).unwrap_or_else(|_| format!("{key:?}"));
                out.push_str(&quoted.blue().bold().to_string());
                out.push_str(": ");
                colorize_value(item, depth + 1, out);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
        }
    }
}
