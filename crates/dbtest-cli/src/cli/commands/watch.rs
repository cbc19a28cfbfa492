use crate::cli::args::TestArgs;
use crate::exit_codes;
use chrono::Local;
use dbtest_core::TestSuiteConfig;
use std::time::Duration;

/// Re-run the suite every `--interval-secs` until Ctrl+C.
pub async fn run(config: TestSuiteConfig, args: &TestArgs) -> anyhow::Result<i32> {
    let interval = Duration::from_secs(args.interval_secs.max(1));
    eprintln!("👀 Watch mode active - press Ctrl+C to exit");

    loop {
        eprintln!();
        eprintln!("🔄 Running tests at {}", Local::now().format("%H:%M:%S"));

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = super::test::run_once(&config, args) => {
                if let Err(e) = outcome {
                    eprintln!("❌ Error: {e:#}");
                }
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    eprintln!("Stopping watch loop.");
    Ok(exit_codes::SUCCESS)
}
