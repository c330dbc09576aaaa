use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Highest resolution accepted for saved charts.
pub const MAX_DPI: u32 = 1200;

// ---------------------------------------------------------------------------
// Experiments and channels
// ---------------------------------------------------------------------------

/// Which bench measurement a run characterizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Experiment {
    /// Attenuators AT1..AT3 measured one at a time against control voltage.
    Attenuators,
    /// AT1 swept with AT2 held at a fixed voltage.
    AttenuatorsInSeries,
    /// FV/FB output ratio of the beam-splitter arms against laser power.
    BeamSplitter,
}

impl Experiment {
    pub fn sheets(self) -> &'static [&'static str] {
        match self {
            Experiment::Attenuators => &["AT1", "AT2", "AT3"],
            Experiment::AttenuatorsInSeries => &["AT1_AT2_1V", "AT1_AT2_2V"],
            Experiment::BeamSplitter => &["BM1", "BM2", "BM3", "BM4"],
        }
    }

    /// Number of leading sheet columns that carry measurement data.
    pub fn column_count(self) -> usize {
        match self {
            Experiment::Attenuators | Experiment::AttenuatorsInSeries => 6,
            Experiment::BeamSplitter => 5,
        }
    }

    pub fn default_source(self) -> &'static str {
        match self {
            Experiment::Attenuators | Experiment::AttenuatorsInSeries => "ATENUADORES.xlsx",
            Experiment::BeamSplitter => "BEAMSPLITTER.xlsx",
        }
    }
}

/// One attenuator or beam-splitter arm. Position in the channel list decides
/// its colour and marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub id: String,
    pub active: bool,
}

impl ChannelDescriptor {
    pub fn new(id: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            active,
        }
    }
}

/// What to do when a requested sheet is not in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingSheetPolicy {
    #[default]
    Fail,
    Skip,
}

/// Evenly spaced control voltages, endpoints included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageAxis {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl Default for VoltageAxis {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: 5.0,
            points: 11,
        }
    }
}

impl VoltageAxis {
    pub fn values(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.stop - self.start) / (n - 1) as f64;
                (0..n).map(|i| self.start + step * i as f64).collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Everything one run needs, passed explicitly into each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub experiment: Experiment,
    pub source_path: PathBuf,
    pub save_output: bool,
    pub show_uncertainty_bars: bool,
    pub channels: Vec<ChannelDescriptor>,
    /// Channel whose first laser-power row is the reference power. Defaults
    /// to the first channel.
    pub reference_channel: Option<String>,
    /// Uncertainty of the reference power [µW].
    pub reference_uncertainty: f64,
    pub missing_sheets: MissingSheetPolicy,
    pub voltage_axis: VoltageAxis,
    pub output_dir: PathBuf,
    /// PNG resolution, 1..=[`MAX_DPI`].
    pub dpi: u32,
    pub export_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Defaults matching the bench setup for each experiment.
    pub fn preset(experiment: Experiment) -> Self {
        Self {
            experiment,
            source_path: PathBuf::from(experiment.default_source()),
            save_output: false,
            show_uncertainty_bars: experiment != Experiment::BeamSplitter,
            channels: experiment
                .sheets()
                .iter()
                .map(|id| ChannelDescriptor::new(*id, true))
                .collect(),
            reference_channel: None,
            reference_uncertainty: 1.0,
            missing_sheets: MissingSheetPolicy::Fail,
            voltage_axis: VoltageAxis::default(),
            output_dir: PathBuf::from("."),
            dpi: 300,
            export_dir: None,
        }
    }

    /// Apply a partial configuration on top of this one.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            source_path,
            save_output,
            show_uncertainty_bars,
            channels,
            reference_channel,
            reference_uncertainty,
            missing_sheets,
            voltage_axis,
            output_dir,
            dpi,
            export_dir,
        } = overrides;

        if let Some(v) = source_path {
            self.source_path = v;
        }
        if let Some(v) = save_output {
            self.save_output = v;
        }
        if let Some(v) = show_uncertainty_bars {
            self.show_uncertainty_bars = v;
        }
        if let Some(v) = channels {
            self.channels = v;
        }
        if let Some(v) = reference_channel {
            self.reference_channel = Some(v);
        }
        if let Some(v) = reference_uncertainty {
            self.reference_uncertainty = v;
        }
        if let Some(v) = missing_sheets {
            self.missing_sheets = v;
        }
        if let Some(v) = voltage_axis {
            self.voltage_axis = v;
        }
        if let Some(v) = output_dir {
            self.output_dir = v;
        }
        if let Some(v) = dpi {
            self.dpi = v;
        }
        if let Some(v) = export_dir {
            self.export_dir = Some(v);
        }
    }

    /// Set the active flag of an existing channel.
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<(), AnalysisError> {
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AnalysisError::Config(format!("unknown channel {id}")))?;
        channel.active = active;
        Ok(())
    }

    pub fn active_channels(&self) -> impl Iterator<Item = (usize, &ChannelDescriptor)> {
        self.channels.iter().enumerate().filter(|(_, c)| c.active)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn reference_channel(&self) -> Result<&str, AnalysisError> {
        match &self.reference_channel {
            Some(id) => Ok(id.as_str()),
            None => self
                .channels
                .first()
                .map(|c| c.id.as_str())
                .ok_or_else(|| AnalysisError::Config("no channels configured".into())),
        }
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.reference_uncertainty >= 0.0 && self.reference_uncertainty.is_finite()) {
            return Err(AnalysisError::Config(format!(
                "reference uncertainty must be a non-negative number, got {}",
                self.reference_uncertainty
            )));
        }
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(AnalysisError::Config(format!(
                "dpi must be between 1 and {MAX_DPI}, got {}",
                self.dpi
            )));
        }
        for (i, c) in self.channels.iter().enumerate() {
            if self.channels[..i].iter().any(|o| o.id == c.id) {
                return Err(AnalysisError::Config(format!("duplicate channel {}", c.id)));
            }
        }
        if let Some(id) = &self.reference_channel {
            if !self.channels.iter().any(|c| &c.id == id) {
                return Err(AnalysisError::Config(format!(
                    "reference channel {id} is not a configured channel"
                )));
            }
        }
        Ok(())
    }
}

/// Partial configuration read from a JSON file. Absent fields keep the
/// preset value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub source_path: Option<PathBuf>,
    pub save_output: Option<bool>,
    pub show_uncertainty_bars: Option<bool>,
    pub channels: Option<Vec<ChannelDescriptor>>,
    pub reference_channel: Option<String>,
    pub reference_uncertainty: Option<f64>,
    pub missing_sheets: Option<MissingSheetPolicy>,
    pub voltage_axis: Option<VoltageAxis>,
    pub output_dir: Option<PathBuf>,
    pub dpi: Option<u32>,
    pub export_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_follow_bench_setup() {
        let at = RunConfig::preset(Experiment::Attenuators);
        assert_eq!(at.sheet_names(), vec!["AT1", "AT2", "AT3"]);
        assert!(at.show_uncertainty_bars);
        assert_eq!(at.reference_uncertainty, 1.0);
        assert_eq!(at.reference_channel().unwrap(), "AT1");

        let bm = RunConfig::preset(Experiment::BeamSplitter);
        assert_eq!(bm.channels.len(), 4);
        assert!(!bm.show_uncertainty_bars);
        assert_eq!(bm.experiment.column_count(), 5);
    }

    #[test]
    fn voltage_axis_has_eleven_half_volt_steps() {
        let v = VoltageAxis::default().values();
        assert_eq!(v.len(), 11);
        assert_eq!(v[0], 0.0);
        assert!((v[1] - 0.5).abs() < 1e-12);
        assert!((v[10] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut cfg = RunConfig::preset(Experiment::Attenuators);
        let overrides = ConfigOverrides::from_json_str(
            r#"{
                "source_path": "/data/bench.xlsx",
                "save_output": true,
                "channels": [{"id": "AT1", "active": true}, {"id": "AT3", "active": false}],
                "missing_sheets": "skip"
            }"#,
        )
        .unwrap();
        cfg.apply(overrides);

        assert_eq!(cfg.source_path, PathBuf::from("/data/bench.xlsx"));
        assert!(cfg.save_output);
        assert!(cfg.show_uncertainty_bars);
        assert_eq!(cfg.missing_sheets, MissingSheetPolicy::Skip);
        let active: Vec<_> = cfg.active_channels().map(|(i, c)| (i, c.id.clone())).collect();
        assert_eq!(active, vec![(0, "AT1".to_string())]);
    }

    #[test]
    fn unknown_override_field_is_rejected() {
        assert!(ConfigOverrides::from_json_str(r#"{"save_figure": true}"#).is_err());
    }

    #[test]
    fn set_active_rejects_unknown_channel() {
        let mut cfg = RunConfig::preset(Experiment::Attenuators);
        cfg.set_active("AT2", false).unwrap();
        assert!(!cfg.channels[1].active);
        assert!(matches!(
            cfg.set_active("AT9", true),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn validate_catches_bad_values() {
        let mut cfg = RunConfig::preset(Experiment::Attenuators);
        assert!(cfg.validate().is_ok());

        cfg.reference_uncertainty = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RunConfig::preset(Experiment::Attenuators);
        cfg.reference_channel = Some("BM1".into());
        assert!(cfg.validate().is_err());

        let mut cfg = RunConfig::preset(Experiment::Attenuators);
        cfg.channels.push(ChannelDescriptor::new("AT1", false));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn dpi_is_capped() {
        let mut cfg = RunConfig::preset(Experiment::BeamSplitter);
        cfg.dpi = MAX_DPI;
        assert!(cfg.validate().is_ok());

        for dpi in [0, MAX_DPI + 1, 20_000] {
            cfg.dpi = dpi;
            assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
        }
    }
}
