use anyhow::Context;
use spoolkit::{init_logging, job::JobDescription, SettingsPersistence};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    let mut args = std::env::args_os().skip(1);
    let job_path: PathBuf = match args.next() {
        Some(path) => path.into(),
        None => {
            eprintln!("usage: spoolkit <job.json> [config.toml]");
            std::process::exit(2);
        }
    };

    let config = match args.next() {
        Some(path) => {
            let path: PathBuf = path.into();
            spoolkit::Config::load_from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => SettingsPersistence::load_or_default()?.config().clone(),
    };

    let job = JobDescription::load(&job_path)?;
    spoolkit::job::run(&job, &config)?;
    Ok(())
}
