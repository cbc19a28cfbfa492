use super::connection::suite_config;
use crate::cli::args::StatusArgs;
use crate::exit_codes;
use dbtest_core::status::{ConnectionStatus, StatusBadge};
use std::ops::ControlFlow;
use std::time::Duration;

pub async fn run(args: StatusArgs) -> anyhow::Result<i32> {
    let mut badge = StatusBadge::new(suite_config(&args.connection)?);

    if args.once {
        let state = badge.poll().await;
        println!("{}", state.summary());
        return Ok(if state.status == ConnectionStatus::Connected {
            exit_codes::SUCCESS
        } else {
            exit_codes::TESTS_FAILED
        });
    }

    let interval = Duration::from_secs(args.interval_secs.max(1));
    eprintln!("Press Ctrl+C to stop.");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = badge.run(interval, |state| {
            println!("{}", state.summary());
            ControlFlow::Continue(())
        }) => {}
    }
    Ok(exit_codes::SUCCESS)
}
