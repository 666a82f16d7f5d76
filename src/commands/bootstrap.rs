//! Full bootstrap of the mirror from the remote collections.

use clap::Args;

use super::CommandError;
use hevymirror::config::Config;
use hevymirror::db::RelationalMirror;
use hevymirror::sync::{bootstrap, HevyClient, TracingProgress};

/// Download every workout and exercise template into the mirror
#[derive(Debug, Args)]
pub struct BootstrapCommand {
    /// Delete everything already mirrored before populating
    #[arg(long)]
    reset: bool,
}

impl BootstrapCommand {
    pub async fn run(
        &self,
        mirror: &mut RelationalMirror,
        config: &Config,
    ) -> Result<(), CommandError> {
        let client = HevyClient::from_config(&config.api)?;

        println!("Fetching snapshot from {}...", client.base_url());
        let counts = bootstrap(&client, mirror, self.reset, &TracingProgress).await?;

        println!();
        println!("Bootstrap complete.");
        println!("  {} workouts", counts.workouts);
        println!("  {} exercises", counts.exercises);
        println!("  {} sets", counts.sets);
        println!("  {} exercise templates", counts.exercise_templates);
        println!("  {} muscle groups", counts.muscle_groups);

        Ok(())
    }
}
