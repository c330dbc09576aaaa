use std::path::PathBuf;

use crate::chart::render::save_png;
use crate::chart::{Chart, ErrorBarStyle, ReferenceLine};
use crate::color::{StyleCycle, BLACK, GRAY};
use crate::config::{Experiment, RunConfig};
use crate::data::derive::{derive_loss, derive_power, derive_ratio, Quantity};
use crate::data::export::export_chart;
use crate::data::loader::load_workbook;
use crate::data::measurement::{AttenuatorMeasurement, SplitterMeasurement};
use crate::data::model::Workbook;
use crate::error::AnalysisError;
use crate::filename::{output_filename, output_filename_with_suffix};

/// Charts of one run plus the files written for them.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub charts: Vec<Chart>,
    pub saved: Vec<PathBuf>,
    pub exported: Vec<PathBuf>,
}

/// Load → model → derive → chart, then save / export as configured.
pub fn run(config: &RunConfig) -> Result<RunOutput, AnalysisError> {
    config.validate()?;

    let workbook = load_workbook(
        &config.source_path,
        &config.sheet_names(),
        config.experiment.column_count(),
        config.missing_sheets,
    )?;
    let charts = build_charts(&workbook, config)?;

    let mut output = RunOutput {
        charts,
        ..Default::default()
    };

    if config.save_output {
        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            AnalysisError::Plot(format!("creating {}: {e}", config.output_dir.display()))
        })?;
        for chart in &output.charts {
            let path = config.output_dir.join(&chart.file_name);
            save_png(chart, &path, config.dpi)?;
            output.saved.push(path);
        }
    }

    if let Some(dir) = &config.export_dir {
        for chart in &output.charts {
            output.exported.push(export_chart(chart, dir)?);
        }
    }

    Ok(output)
}

/// The charts an experiment produces from an already loaded workbook.
pub fn build_charts(workbook: &Workbook, config: &RunConfig) -> Result<Vec<Chart>, AnalysisError> {
    let charts = match config.experiment {
        Experiment::Attenuators | Experiment::AttenuatorsInSeries => attenuator_charts(workbook, config)?,
        Experiment::BeamSplitter => vec![splitter_chart(workbook, config)?],
    };
    if charts.iter().all(|c| c.series.is_empty()) {
        log::warn!("No active channel with data; charts will be empty");
    }
    Ok(charts)
}

// ---------------------------------------------------------------------------
// Attenuators
// ---------------------------------------------------------------------------

fn attenuator_charts(workbook: &Workbook, config: &RunConfig) -> Result<Vec<Chart>, AnalysisError> {
    let voltages = config.voltage_axis.values();
    let measurement = AttenuatorMeasurement::from_workbook(workbook, config, voltages.len())?;
    let reference = measurement.reference;
    log::info!(
        "Reference laser power {} µW (± {} µW)",
        reference.value,
        reference.uncertainty
    );

    let heading = match config.experiment {
        Experiment::AttenuatorsInSeries => "AT1 variável e AT2 fixo",
        _ => "Atenuadores",
    };

    let plans = [
        (
            Quantity::DecibelLoss,
            "Transmissão".to_string(),
            "Perda em decibéis",
            "transmissao_atenuadores",
        ),
        (
            Quantity::DetectedPower,
            format!("{heading} - Potência inicial do laser = {} µW", reference.value),
            "Potência detectada [µW]",
            "caracterizacao_atenuadores",
        ),
    ];

    let cycle = StyleCycle::attenuators();
    let mut charts = Vec::with_capacity(plans.len());
    for (quantity, title, y_label, base) in plans {
        let mut chart = Chart::new(title, "Tensão [V]", y_label);
        chart.x_ticks = Some(voltages.clone());
        chart.show_error_bars = config.show_uncertainty_bars;
        chart.error_bars = ErrorBarStyle::default();
        chart.file_name = output_filename(base, &config.channels);

        for readings in &measurement.channels {
            let derived = match quantity {
                Quantity::DecibelLoss => derive_loss(readings, &reference)?,
                Quantity::DetectedPower => derive_power(readings)?,
            };
            chart.push_series(
                format!("Atenuador {}", readings.id),
                cycle.style_for(readings.position),
                &voltages,
                &derived,
            )?;
        }
        charts.push(chart);
    }
    Ok(charts)
}

// ---------------------------------------------------------------------------
// Beam-splitter
// ---------------------------------------------------------------------------

fn splitter_chart(workbook: &Workbook, config: &RunConfig) -> Result<Chart, AnalysisError> {
    let measurement = SplitterMeasurement::from_workbook(workbook, config)?;

    let mut chart = Chart::new(
        "Razão entre as Potências de saída FV e FB - Beam Splitter (BM)",
        "Potência do Laser [mW]",
        "Razão FV/FB",
    );
    chart.size_inches = (12.0, 6.0);
    chart.show_error_bars = config.show_uncertainty_bars;
    chart.error_bars = ErrorBarStyle {
        color: GRAY,
        width: 1.0,
        cap: 5.0,
    };
    chart.file_name = output_filename_with_suffix("razao_fv_fb", &config.channels, "_com_incertezas");

    let cycle = StyleCycle::splitter();
    for arm in &measurement.arms {
        let derived = derive_ratio(arm)?;
        log::info!("Razão FV/FB para {}: {:?}", arm.id, derived.values);
        log::info!("Incerteza da Razão FV/FB para {}: {:?}", arm.id, derived.uncertainties);
        chart.push_series(
            format!("Razão FV/FB - {}", arm.id),
            cycle.style_for(arm.position),
            &arm.laser,
            &derived,
        )?;
    }

    chart.reference_lines.push(ReferenceLine {
        y: 1.0,
        label: "Razão = 1".into(),
        color: BLACK,
    });
    Ok(chart)
}
