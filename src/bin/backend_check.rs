use slate::backend::{ClientContext, DocumentStore, ItemQuery};
use slate::config::SlateConfig;

/// One-shot backend diagnostic: sign in with operator-supplied credentials
/// and run each of the three list queries once. The history query needs a
/// composite index; this is the quickest way to find out it is missing.
#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .unwrap()
        .with_syslog_identifier("slate-backend-check".to_string())
        .install()
        .unwrap();
    log::set_max_level(log::LevelFilter::Info);

    let config = SlateConfig::load();

    println!("=== Backend Check ===\n");

    if config.is_placeholder() {
        println!(
            "Config at {} still has placeholder keys. Add real project keys first.",
            SlateConfig::config_path().display()
        );
        return;
    }

    let email = match std::env::var("SLATE_EMAIL") {
        Ok(v) => v,
        Err(_) => {
            println!("Set SLATE_EMAIL and SLATE_PASSWORD to a test account.");
            return;
        }
    };
    let password = std::env::var("SLATE_PASSWORD").unwrap_or_default();

    let ctx = match ClientContext::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            println!("Client error: {}", e);
            return;
        }
    };

    let user = match ctx.sign_in(&email, &password).await {
        Ok(user) => user,
        Err(e) => {
            println!("Sign-in failed: {}", e.user_message());
            return;
        }
    };
    println!("Signed in as {} ({})\n", user.email, user.uid);

    let queries = [
        ("active tasks", ItemQuery::tasks(user.uid.clone())),
        ("notes", ItemQuery::notes(user.uid.clone())),
        ("completed history", ItemQuery::completed_tasks(user.uid.clone())),
    ];

    let mut failures = 0;
    for (label, query) in &queries {
        match ctx.store.run_query(query).await {
            Ok(items) => println!("  {}: OK ({} items)", label, items.len()),
            Err(e) if e.is_index_required() => {
                failures += 1;
                println!("  {}: COMPOSITE INDEX MISSING", label);
                println!("    {}", e);
            }
            Err(e) => {
                failures += 1;
                println!("  {}: error: {}", label, e);
            }
        }
    }

    match ctx.store.profile(&user.uid).await {
        Ok(Some(record)) => println!("\n  profile record: OK (name: {})", record.name),
        Ok(None) => println!("\n  profile record: MISSING (register flow never ran?)"),
        Err(e) => println!("\n  profile record: error: {}", e),
    }

    if failures == 0 {
        println!("\n=== All queries healthy ===");
    } else {
        println!("\n=== {} query problem(s) found ===", failures);
    }
}
