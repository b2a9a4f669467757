// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{crate_version, Parser};
use klicksession::config::Settings;
use klicksession::session::ArdourSession;
use klicksession::tempomap::read_tempomap;
use klicksession::timeline::TimelineConverter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Writes a klick tempo map into the tempo map and markers of an Ardour session."
)]
struct Cli {
    /// The path to the klick tempo map.
    tempomap: PathBuf,
    /// The path to the Ardour session file. It is overwritten unless --output is given.
    session: PathBuf,
    /// Write the converted session to this path instead.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// A YAML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Convert and report without saving the session.
    #[arg(short = 'n', long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(cli.config.as_deref())?;
    let entries = read_tempomap(&cli.tempomap)?;

    let mut session = ArdourSession::open(&cli.session)?;
    if let Some(output) = &cli.output {
        session.save_as(output);
    }

    let mut converter = TimelineConverter::new(&mut session, &settings);
    if cli.dry_run {
        converter.emit(&entries)?;
        info!("Dry run, session not saved");
        return Ok(());
    }
    converter.write(&entries)?;
    Ok(())
}
