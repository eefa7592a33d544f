use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use parking_lot::Mutex;
use reel_core::{Contention, SpinnerEngine, SpinnerEvent};
use std::{path::PathBuf, sync::Arc};

#[derive(Args)]
pub struct SpinArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Number of items to advance. A random spin is drawn when omitted.
    #[arg(long, allow_hyphen_values = true)]
    pub increment: Option<i64>,
}

impl SpinArgs {
    pub fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.config)?;
        config.validate()?;

        tracing::info!("Loaded reel from {}", self.config.display());

        let engine = SpinnerEngine::with_shared_scheduler(config.motion)
            .context("failed to create spinner engine")?;
        engine.set_data(config.reel.items, Contention::Reject)?;

        let observed = engine.clone();
        let last_index = Arc::new(Mutex::new(observed.current_index()));
        engine.add_listener(move |event: &SpinnerEvent| {
            if *event != SpinnerEvent::StateChanged {
                return;
            }
            let index = observed.current_index();
            let mut last = last_index.lock();
            if *last != index {
                *last = index;
                if let Some(item) = observed.current_item() {
                    tracing::info!(index = ?index, "{item}");
                }
            }
        });

        let started = match self.increment {
            Some(increment) => engine.spin(increment),
            None => engine.spin_random(),
        };
        if !started {
            anyhow::bail!("spin did not start: the increment was zero");
        }
        if let Some(plan) = engine.trajectory() {
            tracing::info!(
                "Spinning {} items over {:.2}s",
                plan.x_f() - plan.x0(),
                plan.duration().as_secs_f64()
            );
        }

        engine.wait_until_idle();

        let item = engine
            .current_item()
            .context("reel has no item under the pointer")?;
        println!("Landed on {item} (index {})", engine.current_index().unwrap_or(0));

        Ok(())
    }
}
