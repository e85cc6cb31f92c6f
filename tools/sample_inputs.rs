//! Sample Input Generator
//!
//! Writes random phone specs as JSON lines for batch prediction runs.

use clap::Parser;
use phone_price_predictor::types::phone::{
    PhoneSpecs, ProcessorBrand, BATTERY_OPTIONS, RAM_OPTIONS, ROM_OPTIONS,
};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Generate random phone specs as JSON lines")]
struct Args {
    /// Number of phones to generate
    #[arg(short = 'n', long, default_value_t = 100)]
    count: u64,

    /// Fraction of phones with an unrecognized processor brand
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    unknown_brand_rate: f64,
}

/// Accept a probability in [0, 1]; NaN and infinities are rejected
fn parse_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .parse()
        .map_err(|e| format!("`{}` is not a number: {}", value, e))?;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(format!("`{}` is not a rate between 0 and 1", value));
    }
    Ok(rate)
}

/// Phone spec generator drawing from the training catalogue
struct SpecsGenerator {
    rng: rand::rngs::ThreadRng,
}

impl SpecsGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a phone whose values all occur in the training data
    fn generate_catalog(&mut self) -> PhoneSpecs {
        let brand = ProcessorBrand::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ProcessorBrand::Snapdragon);

        PhoneSpecs {
            ram: self.pick(&RAM_OPTIONS),
            rom: self.pick(&ROM_OPTIONS),
            battery: self.pick(&BATTERY_OPTIONS),
            rear_cam_size: self.pick(&[8, 12, 13, 48, 50, 64, 108, 200]),
            rear_cam_count: self.rng.gen_range(1..=5),
            front_cam_size: self.pick(&[0, 5, 8, 12, 16, 32]),
            front_cam_count: self.rng.gen_range(1..=2),
            processor: brand.to_string(),
        }
    }

    /// Generate a phone with a processor label the models never saw
    fn generate_unknown_brand(&mut self) -> PhoneSpecs {
        let label = self.pick(&["Tensor", "Kirin", "Unisoc", "snapdragon"]);
        PhoneSpecs {
            processor: label.to_string(),
            ..self.generate_catalog()
        }
    }

    fn pick<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_inputs=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut generator = SpecsGenerator::new();
    let mut rng = rand::thread_rng();
    let mut unknown_count = 0;

    for _ in 0..args.count {
        let specs = if rng.gen_bool(args.unknown_brand_rate) {
            unknown_count += 1;
            generator.generate_unknown_brand()
        } else {
            generator.generate_catalog()
        };
        println!("{}", serde_json::to_string(&specs)?);
    }

    info!(
        count = args.count,
        unknown_brand = unknown_count,
        "Generated sample inputs"
    );

    Ok(())
}
