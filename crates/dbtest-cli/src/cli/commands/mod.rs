use super::args::*;
use crate::exit_codes;

pub mod connection;
pub mod init;
pub mod setup;
pub mod status;
pub mod test;
pub mod watch;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Test(args) => test::run(args).await,
        Command::Setup(args) => setup::run(args),
        Command::Init => init::run(),
        Command::Status(args) => status::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}
