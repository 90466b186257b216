//! get-aria2 command line entry point.

// Status lines go to stdout when the binary is written to a file
#![allow(clippy::print_stdout, clippy::print_stderr)]

use get_aria2::{Aria2Fetcher, FetchConfig, Target};
use get_aria2_cli::cli::{self, Cli, EXIT_ERROR, EXIT_OK};
use get_aria2_cli::install;
use get_aria2_cli::tracing::{self as cli_tracing, TracingConfig};

fn main() {
    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
    };
    if let Err(e) = cli_tracing::init_tracing(tracing_config) {
        eprintln!("{e:?}");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let exit_code = match rt.block_on(run(cli)) {
        Ok(()) => EXIT_OK,
        Err(report) => {
            eprintln!("{report:?}");
            EXIT_ERROR
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> miette::Result<()> {
    let target = Target::from_options(cli.platform.as_deref(), cli.arch.as_deref())?;
    let fetcher = Aria2Fetcher::new(FetchConfig::from_env())?;

    if cli.show_status() {
        println!("downloading the latest version of aria2");
    }
    let result = fetcher.get_binary_for(target).await?;
    let (stream, version, drain) = result.into_parts();
    if cli.show_status() {
        println!("downloaded aria2 version: {version}");
    }

    let Some(destination) = cli.destination.as_deref() else {
        install::write_to_stdout(stream).await?;
        drain.wait().await?;
        return Ok(());
    };

    let path = install::output_path(destination, target.platform(), cli.ext);
    install::write_to_file(stream, &path).await?;
    drain.wait().await?;
    if cli.show_status() {
        println!("wrote aria2c to: {}", path.display());
    }

    if install::should_chmod(cli.chmod, target.platform()) {
        install::make_executable(&path)?;
        tracing::debug!(path = %path.display(), "marked executable");
    }

    Ok(())
}
