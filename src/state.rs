use crate::chart::Chart;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// The full viewer state, independent of rendering.
pub struct ViewerState {
    /// Charts produced by the run, in pipeline order.
    pub charts: Vec<Chart>,

    /// Index of the chart on screen.
    pub selected: usize,

    /// Per chart, per series visibility.
    pub visible: Vec<Vec<bool>>,

    /// Resolution used by PNG export.
    pub dpi: u32,

    /// Last export outcome shown in the top bar.
    pub status: Option<Status>,
}

impl ViewerState {
    pub fn new(charts: Vec<Chart>, dpi: u32) -> Self {
        let visible = charts.iter().map(|c| vec![true; c.series.len()]).collect();
        Self {
            charts,
            selected: 0,
            visible,
            dpi,
            status: None,
        }
    }

    pub fn current(&self) -> Option<&Chart> {
        self.charts.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.charts.len() {
            self.selected = index;
        }
    }

    /// Visibility flags of the selected chart's series.
    pub fn current_visibility(&self) -> &[bool] {
        self.visible
            .get(self.selected)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn toggle_series(&mut self, series: usize) {
        if let Some(flag) = self
            .visible
            .get_mut(self.selected)
            .and_then(|v| v.get_mut(series))
        {
            *flag = !*flag;
        }
    }

    /// Show or hide every series of the selected chart.
    pub fn set_all(&mut self, shown: bool) {
        if let Some(flags) = self.visible.get_mut(self.selected) {
            flags.iter_mut().for_each(|f| *f = shown);
        }
    }

    pub fn toggle_error_bars(&mut self) {
        if let Some(chart) = self.charts.get_mut(self.selected) {
            chart.show_error_bars = !chart.show_error_bars;
        }
    }

    /// The selected chart restricted to its visible series.
    pub fn visible_chart(&self) -> Option<Chart> {
        self.current()
            .map(|chart| chart.with_visible(self.current_visibility()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::StyleCycle;
    use crate::data::derive::DerivedSeries;

    fn chart(title: &str, ids: &[&str]) -> Chart {
        let mut chart = Chart::new(title, "x", "y");
        for (i, id) in ids.iter().enumerate() {
            chart
                .push_series(
                    *id,
                    StyleCycle::attenuators().style_for(i),
                    &[0.0],
                    &DerivedSeries {
                        channel: id.to_string(),
                        values: vec![1.0],
                        uncertainties: vec![0.1],
                    },
                )
                .unwrap();
        }
        chart
    }

    #[test]
    fn toggles_apply_to_selected_chart_only() {
        let mut state = ViewerState::new(vec![chart("a", &["AT1", "AT2"]), chart("b", &["AT1", "AT2"])], 300);
        state.toggle_series(1);
        assert_eq!(state.visible_chart().unwrap().series.len(), 1);

        state.select(1);
        assert_eq!(state.visible_chart().unwrap().series.len(), 2);

        state.set_all(false);
        assert!(state.visible_chart().unwrap().series.is_empty());
        state.select(0);
        assert_eq!(state.current_visibility(), &[true, false]);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut state = ViewerState::new(vec![chart("a", &["AT1"])], 300);
        state.select(5);
        assert_eq!(state.selected, 0);
        state.toggle_series(9);
        assert_eq!(state.current_visibility(), &[true]);
    }

    #[test]
    fn error_bar_toggle_flips_current_chart() {
        let mut state = ViewerState::new(vec![chart("a", &["AT1"])], 300);
        assert!(!state.current().unwrap().show_error_bars);
        state.toggle_error_bars();
        assert!(state.current().unwrap().show_error_bars);
    }

    #[test]
    fn empty_viewer_has_no_chart() {
        let state = ViewerState::new(Vec::new(), 300);
        assert!(state.visible_chart().is_none());
        assert!(state.current_visibility().is_empty());
    }
}
