use serde_json::json;

use optobench::data::loader::{JsonColumn, JsonSheet, JsonWorkbook};
use optobench::data::measurement::{
    DETECTOR_POWER_UW, LASER_POWER_UW, SPLITTER_FB_SIGMA_UW, SPLITTER_FB_UW, SPLITTER_FV_SIGMA_UW,
    SPLITTER_FV_UW, SPLITTER_LASER_MW, UNCERTAINTY_UW,
};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn column(name: &str, values: &[f64]) -> JsonColumn {
    JsonColumn {
        name: name.to_string(),
        values: values.iter().map(|v| json!((v * 100.0).round() / 100.0)).collect(),
    }
}

/// Detector reading with meter noise; uncertainty is 1 % of reading + 1 µW.
fn reading(rng: &mut SimpleRng, power: f64) -> (f64, f64) {
    let sigma = 0.01 * power + 1.0;
    (rng.gauss(power, sigma * 0.3).max(0.5), sigma)
}

/// One attenuator sheet: loss grows linearly in dB with control voltage.
fn attenuator_sheet(rng: &mut SimpleRng, name: &str, db_per_volt: f64, offset_db: f64) -> JsonSheet {
    const LASER_UW: f64 = 1200.0;
    let voltages: Vec<f64> = (0..11).map(|i| i as f64 * 0.5).collect();

    let mut detector = Vec::with_capacity(voltages.len());
    let mut sigma = Vec::with_capacity(voltages.len());
    for (i, v) in voltages.iter().enumerate() {
        let loss_db = offset_db + db_per_volt * v;
        let (p, s) = reading(rng, LASER_UW * 10f64.powf(-loss_db / 10.0));
        // An unattenuated channel reads the full laser power at 0 V.
        detector.push(if i == 0 && offset_db == 0.0 { LASER_UW } else { p });
        sigma.push(s);
    }

    JsonSheet {
        name: name.to_string(),
        columns: vec![
            column("TENSÃO [V]", &voltages),
            column(LASER_POWER_UW, &vec![LASER_UW; voltages.len()]),
            column(DETECTOR_POWER_UW, &detector),
            column(UNCERTAINTY_UW, &sigma),
        ],
    }
}

/// One beam-splitter sheet with a slightly unbalanced FV/FB split.
fn splitter_sheet(rng: &mut SimpleRng, name: &str, fv_share: f64) -> JsonSheet {
    let laser_mw: Vec<f64> = (1..=10).map(|i| i as f64).collect();
    let (mut fv, mut fb, mut fv_sigma, mut fb_sigma) = (vec![], vec![], vec![], vec![]);
    for p in &laser_mw {
        let total_uw = p * 1000.0 * 0.9;
        let (a, sa) = reading(rng, total_uw * fv_share);
        let (b, sb) = reading(rng, total_uw * (1.0 - fv_share));
        fv.push(a);
        fb.push(b);
        fv_sigma.push(sa);
        fb_sigma.push(sb);
    }

    JsonSheet {
        name: name.to_string(),
        columns: vec![
            column(SPLITTER_LASER_MW, &laser_mw),
            column(SPLITTER_FV_UW, &fv),
            column(SPLITTER_FB_UW, &fb),
            column(SPLITTER_FV_SIGMA_UW, &fv_sigma),
            column(SPLITTER_FB_SIGMA_UW, &fb_sigma),
        ],
    }
}

fn write(path: &str, workbook: &JsonWorkbook) {
    let text = serde_json::to_string_pretty(workbook).expect("Failed to serialize workbook");
    std::fs::write(path, text).expect("Failed to write output file");
    println!("Wrote {} sheets to {path}", workbook.sheets.len());
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let attenuators = JsonWorkbook {
        sheets: vec![
            attenuator_sheet(&mut rng, "AT1", 3.0, 0.0),
            attenuator_sheet(&mut rng, "AT2", 2.2, 0.4),
            attenuator_sheet(&mut rng, "AT3", 1.5, 0.8),
            attenuator_sheet(&mut rng, "AT1_AT2_1V", 3.0, 2.2),
            attenuator_sheet(&mut rng, "AT1_AT2_2V", 3.0, 4.4),
        ],
    };
    write("sample_atenuadores.json", &attenuators);

    let splitter = JsonWorkbook {
        sheets: vec![
            splitter_sheet(&mut rng, "BM1", 0.49),
            splitter_sheet(&mut rng, "BM2", 0.51),
            splitter_sheet(&mut rng, "BM3", 0.50),
            splitter_sheet(&mut rng, "BM4", 0.47),
        ],
    };
    write("sample_beam_splitter.json", &splitter);
}
