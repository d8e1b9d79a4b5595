//! The `repose` CLI tool.

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use repose_repo::{load_manifest, Config, Driver, NullSigner};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose.log_level_filter());

    let repo_name = cli.repo_name();
    let root = cli.root.clone();

    // With no targets on the command line, fall back to `<repo>.manifest`
    // in the repository root, one target per line.
    let targets = if cli.targets.is_empty() {
        match load_manifest(&root.join(format!("{repo_name}.manifest"))) {
            Ok(targets) => targets,
            Err(error) => {
                log::error!("repose: {error}");
                return ExitCode::from(2);
            }
        }
    } else {
        cli.targets.clone()
    };

    let config = Config {
        repo_name,
        root,
        pool: cli.pool_dir(),
        arch: cli.arch(),
        files: cli.files,
        list: cli.list,
        drop: cli.drop,
        sign: cli.sign,
        reflink: cli.reflink,
        rebuild: cli.rebuild,
        compression: cli.compression(),
        targets,
    };

    let signer = NullSigner;
    let driver = Driver::new(&config, &signer);

    match driver.run() {
        Ok(report) => {
            if config.list {
                for pkg in &report.packages {
                    println!("{}", pkg.name_version());
                }
            }
            if report.empty && !config.drop {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            log::error!("repose: {error}");
            ExitCode::from(2)
        }
    }
}

fn init_logger(level: LevelFilter) {
    if TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("repose: failed to initialize logger");
    }
}
