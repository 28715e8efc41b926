use clap::Parser;
use iaflat_cli::{Args, ConsoleProgress, init_logger, run};
use std::process::ExitCode;

#[iaflat_runtime::main(parallel)]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let _log = init_logger(&args)?;

    let outcome = run(&args, &ConsoleProgress::new()).await?;
    outcome.print();
    Ok(outcome.exit_code())
}
