use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};

use optobench::config::{ConfigOverrides, Experiment, MissingSheetPolicy, RunConfig};
use optobench::AnalysisError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Attenuator and beam-splitter characterization charts", long_about = None)]
struct Cli {
    /// Bench measurement to process
    #[arg(value_enum)]
    experiment: Experiment,

    /// JSON file with configuration overrides
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Workbook with the measurement sheets (.xlsx, .ods or .json)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    source: Option<PathBuf>,

    /// Save every chart as PNG
    #[arg(long, action = ArgAction::SetTrue)]
    save: bool,

    /// Draw uncertainty bars (true/false)
    #[arg(long, value_name = "BOOL")]
    uncertainty_bars: Option<bool>,

    /// Activate a channel (repeatable)
    #[arg(long, value_name = "ID")]
    enable: Vec<String>,

    /// Deactivate a channel (repeatable)
    #[arg(long, value_name = "ID")]
    disable: Vec<String>,

    /// Warn about missing sheets instead of failing
    #[arg(long, action = ArgAction::SetTrue)]
    allow_missing_sheets: bool,

    /// Directory for saved PNG files
    #[arg(long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Resolution of saved PNG files (1 to 1200)
    #[arg(long)]
    dpi: Option<u32>,

    /// Also write the computed series as CSV into this directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    export_csv: Option<PathBuf>,

    /// Do not open the viewer window
    #[arg(long, action = ArgAction::SetTrue)]
    headless: bool,
}

impl Cli {
    /// Preset, then config file, then flags.
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::preset(self.experiment);
        if let Some(path) = &self.config {
            config.apply(ConfigOverrides::from_json_file(path)?);
        }

        config.apply(ConfigOverrides {
            source_path: self.source.clone(),
            save_output: self.save.then_some(true),
            show_uncertainty_bars: self.uncertainty_bars,
            missing_sheets: self.allow_missing_sheets.then_some(MissingSheetPolicy::Skip),
            output_dir: self.output_dir.clone(),
            dpi: self.dpi,
            export_dir: self.export_csv.clone(),
            ..Default::default()
        });
        for id in &self.enable {
            config.set_active(id, true)?;
        }
        for id in &self.disable {
            config.set_active(id, false)?;
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.run_config()?;
    log::debug!("Run configuration: {config:?}");

    let output = optobench::run(&config)
        .with_context(|| format!("{:?} run on {}", config.experiment, config.source_path.display()))?;

    for path in output.saved.iter().chain(&output.exported) {
        println!("{}", path.display());
    }

    if !cli.headless && !output.charts.is_empty() {
        optobench::app::show(output.charts, config.dpi)
            .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<AnalysisError>())
                .map_or(1, AnalysisError::exit_code);
            ExitCode::from(code)
        }
    }
}
