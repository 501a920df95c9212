//! 🚀 trisect-cli — the front door, the bouncer, the maitre d' of trisect.
//!
//! 🎬 *[narrator voice]* "It all started with a bucket and a deadline..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆
//!
//! 🚦 Exit codes, because schedulers read numbers, not emoji:
//! - 0 — manifest written, go train something
//! - 2 — listing phase failed (the bucket hung up on us)
//! - 3 — manifest write phase failed (the disk has opinions)
//! - 1 — everything else (config typos, percentage crimes, cosmic rays)

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;
use trisect::RunPhase;

/// 🚀 main() — where it all begins. The genesis. The big bang.
/// The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Grab the config path from argv (or fall back to trisect.toml)
/// 3. Load config (the moment of truth)
/// 4. Run both passes (send it and pray 🙏)
/// 5. Handle errors (cry, but with distinct exit codes)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 Set up tracing — because println! debugging is a lifestyle choice
    // we're trying to move past, like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 🎯 Grab the args like catching Pokémon — gotta get at least 1
    let args: Vec<String> = std::env::args().collect();
    let path_arg = match args.get(1) {
        Some(s) => s.as_str(),
        None => "trisect.toml", // 🔧 default: the ol' reliable
    };

    // 🔒 Validate the config file exists before we get too emotionally attached
    let config_file = std::path::Path::new(path_arg);
    let config_file_path_which_is_validated_to_exist = match config_file.try_exists()
        .context(format!("💀 Configuration file may not exist, couldn't find it. Double check that it exists, or maybe, it's an issue with pwd/cwd and relative paths. In that case, use an absolute path, to be absolutely certain, you are not messing this up. Was checking here: '{}'", config_file.display()))?
    {
        true => Some(config_file),  // ✅ Found it! Better than finding my car keys
        false => None               // 💤 Not there. Env vars only. Living dangerously.
    };

    // 🔧 Load the config — this is the moment where we find out if the TOML is valid
    // or if someone put a tab where a space should be (looking at you, Kevin)
    let app_config = trisect::load_config(config_file_path_which_is_validated_to_exist)
        .context("💀 In trisect-cli, main, we couldn't load the config file, take a look at the file, make sure it's correct. Make sure you didn't forget something obvious, dumas")?;

    // 🚀 SEND IT. Two passes. No take-backs. This is not a drill.
    let result = trisect::run(app_config).await;

    // 💀 Error handling: the part where we find out what went wrong
    // and print it in a way that's helpful at 3am
    match result {
        Ok(summary) => {
            // ✅ If we got here, everything worked. Pop the champagne. 🍾
            println!(
                "✅ Done: {} rows written to '{}' ({} objects across {} categories, {} excluded)",
                summary.rows_written,
                summary.manifest_path,
                summary.objects_listed,
                summary.categories,
                summary.rows_excluded
            );
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🚦 the phase tag rides the context chain; anyhow digs it out
            let failed_phase: Option<RunPhase> = err.downcast_ref::<RunPhase>().copied();
            // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
            let mut the_vibes_are_giving_connection_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                // -- 🕵️ sniff the cause like a truffle pig hunting for connection problems
                let cause_str = cause.to_string();
                if cause_str.contains("error sending request")
                    || cause_str.contains("connection refused")
                    || cause_str.contains("Connection refused")
                    || cause_str.contains("tcp connect error")
                    || cause_str.contains("dns error")
                {
                    the_vibes_are_giving_connection_issues = true;
                }
            }

            // -- 📡 if it smells like a connection problem, it's probably a connection problem
            // -- like when your wifi icon has full bars but nothing loads
            if the_vibes_are_giving_connection_issues {
                error!(
                    "🔧 hint: looks like the storage API isn't reachable. \
                    Double-check the bucket name and `api_base`, make sure you're \
                    online, and if you're pointing at a local fake-GCS container: \
                    `docker ps` to see what's up, or `docker compose up -d` to \
                    resurrect it. Even servers need a nudge sometimes. ☕"
                );
            }

            // 🗑️ Exit with prejudice — and with the phase-specific code,
            // so cron jobs can tell bucket trouble from disk trouble.
            std::process::exit(match failed_phase {
                Some(RunPhase::Listing) => 2,
                Some(RunPhase::Write) => 3,
                None => 1,
            });
        }
    }
}
