use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use serde::Serialize;

/// One output row, laid out like the merged PRSA station table.
#[derive(Serialize)]
struct Row<'a> {
    station: &'a str,
    datetime: String,
    #[serde(rename = "PM2.5")]
    pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pm10: Option<f64>,
    #[serde(rename = "SO2")]
    so2: Option<f64>,
    #[serde(rename = "NO2")]
    no2: Option<f64>,
    #[serde(rename = "CO")]
    co: Option<f64>,
    #[serde(rename = "O3")]
    o3: Option<f64>,
    #[serde(rename = "TEMP")]
    temp: Option<f64>,
    #[serde(rename = "PRES")]
    pres: Option<f64>,
    #[serde(rename = "DEWP")]
    dewp: Option<f64>,
    #[serde(rename = "RAIN")]
    rain: Option<f64>,
}

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

    /// Drop roughly `rate` of the values, like sensor gaps in the real data.
    fn gap(&mut self, value: f64, rate: f64) -> Option<f64> {
        (self.next_f64() >= rate).then_some((value * 10.0).round() / 10.0)
    }
}

/// Seasonal cycle in [-1, 1]: +1 mid-July, -1 mid-January.
fn season(day_of_year: u32) -> f64 {
    (2.0 * std::f64::consts::PI * (day_of_year as f64 - 105.0) / 365.0).sin()
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // (name, pollution scale): suburban stations are cleaner.
    let stations = [
        ("Aotizhongxin", 1.0),
        ("Changping", 0.8),
        ("Dingling", 0.6),
        ("Dongsi", 1.1),
        ("Huairou", 0.7),
    ];
    let missing_rate = 0.02;

    let start = NaiveDate::from_ymd_opt(2013, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let hours = 24 * 365 * 2;

    let output_path = "all_data.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;
    let mut rows = 0usize;

    for &(station, scale) in &stations {
        for h in 0..hours {
            let t = start + Duration::hours(h);
            let s = season(t.ordinal());
            let daily = (2.0 * std::f64::consts::PI * (t.hour() as f64 - 15.0) / 24.0).cos();

            let temp = 12.0 + 15.0 * s + 4.0 * daily + rng.gauss(0.0, 2.0);
            let dewp = temp - 8.0 - 6.0 * (1.0 - s) + rng.gauss(0.0, 2.0);
            let pres = 1012.0 - 10.0 * s + rng.gauss(0.0, 3.0);
            let rain = if s > 0.3 && rng.next_f64() < 0.08 {
                rng.next_f64() * 6.0
            } else {
                0.0
            };

            // Heating season drives particulates, SO2 and CO up; O3 peaks in summer.
            let winter = (1.0 - s) / 2.0;
            let pm25 = (scale * (40.0 + 90.0 * winter) + rng.gauss(0.0, 25.0)).max(2.0);
            let pm10 = pm25 * 1.3 + rng.gauss(0.0, 10.0).abs();
            let so2 = (scale * (3.0 + 30.0 * winter) + rng.gauss(0.0, 4.0)).max(1.0);
            let no2 = (scale * (35.0 + 25.0 * winter) + rng.gauss(0.0, 10.0)).max(2.0);
            let co = (scale * (600.0 + 1500.0 * winter) + rng.gauss(0.0, 200.0)).max(100.0);
            let o3 = (20.0 + 80.0 * (1.0 - winter) * (0.5 + daily / 2.0) + rng.gauss(0.0, 10.0)).max(1.0);

            writer
                .serialize(Row {
                    station,
                    datetime: t.format("%Y-%m-%d %H:%M:%S").to_string(),
                    pm25: rng.gap(pm25, missing_rate),
                    pm10: rng.gap(pm10, missing_rate),
                    so2: rng.gap(so2, missing_rate),
                    no2: rng.gap(no2, missing_rate),
                    co: rng.gap(co, missing_rate),
                    o3: rng.gap(o3, missing_rate),
                    temp: rng.gap(temp, missing_rate),
                    pres: rng.gap(pres, missing_rate),
                    dewp: rng.gap(dewp, missing_rate),
                    rain: rng.gap(rain, missing_rate),
                })
                .context("writing CSV row")?;
            rows += 1;
        }
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {rows} records for {} stations to {output_path}",
        stations.len()
    );
    Ok(())
}
