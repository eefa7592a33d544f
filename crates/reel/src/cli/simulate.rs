use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use reel_core::{Contention, ManualScheduler, SpinnerEngine};
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Number of items to advance.
    #[arg(long, allow_hyphen_values = true)]
    pub increment: i64,

    /// Print a row every this many milliseconds.
    ///
    /// Defaults to the configured sample interval.
    #[arg(long)]
    pub every: Option<u64>,
}

impl SimulateArgs {
    pub fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.config)?;
        config.validate()?;

        let step_ms = self.every.unwrap_or(config.motion.sample_interval_ms);
        if step_ms == 0 {
            anyhow::bail!("--every must be at least 1");
        }

        let scheduler = Arc::new(ManualScheduler::new());
        let engine = SpinnerEngine::new(config.motion, scheduler.clone())
            .context("failed to create spinner engine")?;
        engine.set_data(config.reel.items, Contention::Reject)?;

        if !engine.spin(self.increment) {
            anyhow::bail!("spin did not start: the increment was zero");
        }
        let plan = engine
            .trajectory()
            .context("spin started without a trajectory")?;

        println!(
            "# x0={} x_a={:.4} x_b={:.4} x_f={} t_a={:.1}ms t_b={:.1}ms t_f={:.1}ms peak={:.4}/s",
            plan.x0(),
            plan.x_a(),
            plan.x_b(),
            plan.x_f(),
            plan.t_a(),
            plan.t_b(),
            plan.t_f(),
            plan.peak_rate(),
        );
        println!("{:>10} {:>10} phase", "time_ms", "position");

        // the first tick pins the start of the spin
        scheduler.advance(Duration::ZERO);
        let mut elapsed_ms = 0;
        println!("{elapsed_ms:>10} {:>10.4} {}", engine.position(), plan.phase_at(0.0));
        while engine.is_spinning() {
            scheduler.advance(Duration::from_millis(step_ms));
            elapsed_ms += step_ms;
            println!(
                "{elapsed_ms:>10} {:>10.4} {}",
                engine.position(),
                plan.phase_at(elapsed_ms as f64)
            );
        }

        let item = engine.current_item().unwrap_or_default();
        println!("# landed on {item}");
        Ok(())
    }
}
