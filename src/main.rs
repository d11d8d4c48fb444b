#![allow(dead_code)]

use std::sync::Arc;

mod application;
mod message;
mod pages;

use slate::backend::ClientContext;
use slate::config::SlateConfig;
use slate::core::session::Page;

use application::App;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SlateConfig::load();

    // Set up logging to the systemd user journal (`journalctl --user -t slate -f`).
    // Wrapper filters: slate targets at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("slate") {
                    let max = if slate::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        let journal = systemd_journal_logger::JournalLog::new()
            .unwrap()
            .with_syslog_identifier("slate".to_string());

        slate::set_debug_logging(config.debug_logging);

        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).unwrap();
        // Global max must be Debug so slate debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Parse CLI flags
    let args: Vec<String> = std::env::args().collect();
    let demo = args.iter().any(|a| a == "--demo");
    let start_page = args
        .iter()
        .position(|a| a == "--page")
        .and_then(|i| args.get(i + 1))
        .and_then(|name| {
            Page::ALL
                .iter()
                .find(|p| p.file_name().trim_end_matches(".html") == name.as_str())
                .copied()
        })
        .unwrap_or(Page::Index);

    let ctx = if demo {
        ClientContext::memory()
    } else if config.is_placeholder() {
        log::warn!(
            "Config at {} still has placeholder keys; running against the in-memory backend. \
             Login/Register will not reach the real service until real keys are added.",
            SlateConfig::config_path().display()
        );
        println!("No backend configured; running in demo mode (in-memory backend).");
        ClientContext::memory()
    } else {
        ClientContext::connect(&config)?
    };

    let (app, msg_rx) = App::new(Arc::new(ctx), start_page);
    app.run_console(msg_rx).await;

    Ok(())
}
