use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ConvertResult, ListResult, ProgressEvent, ProgressSink, ProgressSinkKind};
use crate::sync::BulkSyncReport;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_sync(result: &BulkSyncReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_convert(result: &ConvertResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct HumanOutput {
    kind: ProgressSinkKind,
}

impl HumanOutput {
    pub fn new(kind: ProgressSinkKind) -> Self {
        Self { kind }
    }

    pub fn print_sync(report: &BulkSyncReport) {
        println!("{CYAN}📦 template sync summary ({} entries){RESET}", report.total);
        println!("{GREEN}⬇️  Downloaded: {}{RESET}", report.downloaded.len());
        for id in &report.downloaded {
            println!("{GREEN}   • {id}{RESET}");
        }
        println!("{YELLOW}♻️  Skipped: {}{RESET}", report.skipped.len());
        for id in &report.skipped {
            println!("{YELLOW}   • {id}{RESET}");
        }
        println!("{RED}⚠️  Failed: {}{RESET}", report.failed.len());
        for entry in &report.failed {
            let subject = match (&entry.id, entry.index, &entry.document) {
                (Some(id), _, _) => id.to_string(),
                (None, Some(index), _) => format!("entry #{index}"),
                (None, None, Some(document)) => document.clone(),
                (None, None, None) => "-".to_string(),
            };
            println!("{RED}   • {subject}: {}{RESET}", entry.reason);
        }
    }

    pub fn print_list(result: &ListResult) {
        Self::print_sync(&result.sync);
        println!("{CYAN}📁 Known templates: {}{RESET}", result.templates.len());
        for id in &result.templates {
            println!("   {id}");
        }
    }

    pub fn print_convert(result: &ConvertResult) {
        println!("{GREEN}✅ Converted {} ({} elements){RESET}", result.template_id, result.children);
        println!("{CYAN}   📄 {}{RESET}", result.scene_path);
        println!("{CYAN}   🔗 {}{RESET}", result.download_url);
    }
}

impl ProgressSink for HumanOutput {
    fn event(&self, event: ProgressEvent) {
        let scope = match self.kind {
            ProgressSinkKind::Sync => "sync",
            ProgressSinkKind::List => "list",
            ProgressSinkKind::Convert => "convert",
        };
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                scope,
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => tracing::info!(scope, "{}", event.message),
        }
    }
}
