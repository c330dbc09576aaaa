use crate::config::ChannelDescriptor;

/// Label used when no channel is active.
pub const NO_CHANNEL_LABEL: &str = "no_attenuador";

/// `{base}_{id1}_{id2}_….png` over the active channels, in list order, or
/// `{base}_no_attenuador.png` when none is active.
///
/// An empty `base` is kept as is and yields a leading underscore.
pub fn output_filename(base: &str, channels: &[ChannelDescriptor]) -> String {
    output_filename_with_suffix(base, channels, "")
}

/// Like [`output_filename`] with `suffix` inserted before the extension.
pub fn output_filename_with_suffix(base: &str, channels: &[ChannelDescriptor], suffix: &str) -> String {
    let active: Vec<&str> = channels
        .iter()
        .filter(|c| c.active)
        .map(|c| c.id.as_str())
        .collect();

    let label = if active.is_empty() {
        NO_CHANNEL_LABEL.to_string()
    } else {
        active.join("_")
    };
    format!("{base}_{label}{suffix}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(list: &[(&str, bool)]) -> Vec<ChannelDescriptor> {
        list.iter()
            .map(|(id, active)| ChannelDescriptor::new(*id, *active))
            .collect()
    }

    #[test]
    fn joins_active_channels_in_order() {
        let c = channels(&[("a", true), ("b", false), ("c", true)]);
        assert_eq!(output_filename("X", &c), "X_a_c.png");
    }

    #[test]
    fn no_active_channel() {
        assert_eq!(output_filename("X", &[]), "X_no_attenuador.png");
        let c = channels(&[("AT1", false)]);
        assert_eq!(output_filename("X", &c), "X_no_attenuador.png");
    }

    #[test]
    fn empty_base_keeps_leading_underscore() {
        let c = channels(&[("AT1", true)]);
        assert_eq!(output_filename("", &c), "_AT1.png");
    }

    #[test]
    fn suffix_goes_before_extension() {
        let c = channels(&[("BM1", true), ("BM2", true), ("BM3", false)]);
        assert_eq!(
            output_filename_with_suffix("razao_fv_fb", &c, "_com_incertezas"),
            "razao_fv_fb_BM1_BM2_com_incertezas.png"
        );
    }
}
