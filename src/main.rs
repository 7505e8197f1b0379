// SPDX-License-Identifier: MIT
//
// patwatch: watch a stream of log-like lines through a catalog of regex
// patterns.
//
// This is the binary that wires the crates together:
//
//   pw-engine → catalog, matching, pipelines, layout, the Monitor
//               (colors come from pw-theme through the engine)
//   pw-term   → escapes, widths, cbreak input, key reader
//
// Each cycle flows:
//
//   source (cmd / stdin) → Monitor::run_cycle → Monitor::render → stdout
//                                                 (+ --auxcmd output)
//
// and between cycles the driver waits for the interval or a key.
//
// Output for a catalog with two patterns, --color off:
//
//   USER    3       bob amy carol
//   ERR     1       disk-full

mod cli;
mod driver;
mod header;
mod logging;
mod source;
mod stats;

use std::io;
use std::process;

use anyhow::Context;
use clap::Parser;

use pw_engine::{Catalog, Monitor};

use crate::cli::Cli;
use crate::driver::Driver;
use crate::source::{AuxCommand, CommandSource, ContinuousSource, Source, StreamSource};

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.settings()?;
    let timeout = cli.timeout()?;
    let opts = cli.engine_options();

    let catalog = Catalog::load(&cli.patterns, &opts)?;

    let source = match &cli.cmd {
        Some(cmd) => {
            let command = CommandSource::new(&cli.shell, cmd, timeout, cli.no_warn);
            if cli.iterative.is_some() {
                Source::Iterative(command)
            } else {
                Source::Continuous(ContinuousSource::new(command))
            }
        }
        None => Source::Stream(StreamSource::stdin().context("cannot start the input reader")?),
    };

    let mut driver = Driver::new(Monitor::new(catalog, opts), source, settings);
    if let Some(aux) = &cli.auxcmd {
        let command = CommandSource::new(&cli.shell, aux, cli.aux_timeout()?, cli.no_warn);
        driver = driver.with_aux(AuxCommand::new(command, cli.aux_sep(), cli.aux_before));
    }
    driver.run()
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level, cli.no_warn);

    if let Err(e) = run(&cli) {
        // A closed stdout (`patwatch ... | head`) is a normal way to stop.
        let broken_pipe = e
            .downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == io::ErrorKind::BrokenPipe);
        if broken_pipe {
            return;
        }
        eprintln!("patwatch: {e:#}");
        process::exit(1);
    }
}
