use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Context;
use study_buddy::config::AppConfig;
use study_buddy::shell::{self, ShellOptions};
use study_buddy::{logging, providers};

fn main() -> anyhow::Result<()> {
    let loaded = AppConfig::load();

    if let Err(error) = logging::init(&loaded.config.logging) {
        eprintln!("logging disabled: {error}");
    }
    loaded.log_outcome();

    let pipeline = providers::pipeline_from_config(&loaded);
    let interactive = io::stdout().is_terminal();
    let options = ShellOptions {
        render: loaded.config.render.clone(),
        output_dir: PathBuf::from("."),
        spinner: interactive,
        color: interactive,
    };

    shell::run_interactive(pipeline, options).context("terminal session failed")
}
