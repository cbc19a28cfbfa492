use super::connection::suite_config;
use crate::cli::args::TestArgs;
use crate::exit_codes;
use dbtest_core::report::{console, json};
use dbtest_core::{DbTester, TestSuite, TestSuiteConfig};

pub async fn run(args: TestArgs) -> anyhow::Result<i32> {
    // Narration is only wanted alongside --verbose.
    let config = suite_config(&args.connection)?.silent(!args.verbose);

    if args.verbose {
        eprintln!("🔧 Configuration:");
        eprintln!("{}", printable_config(&config)?);
    }

    if args.watch {
        return super::watch::run(config, &args).await;
    }

    let suite = run_once(&config, &args).await?;
    Ok(if suite.overall {
        exit_codes::SUCCESS
    } else {
        exit_codes::TESTS_FAILED
    })
}

/// One suite run plus its report.
pub(crate) async fn run_once(config: &TestSuiteConfig, args: &TestArgs) -> anyhow::Result<TestSuite> {
    let suite = DbTester::new(config.clone())?.run_test_suite().await?;

    if args.json {
        println!("{}", json::to_json_string(&suite)?);
    } else {
        console::print_suite(&suite, args.verbose);
    }
    if let Some(out) = &args.output {
        json::write_json(&suite, out)?;
    }
    Ok(suite)
}

fn printable_config(config: &TestSuiteConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    shown.database = shown.database.redacted();
    Ok(serde_json::to_string_pretty(&shown)?)
}
