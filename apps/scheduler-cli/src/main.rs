use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use shared_config::SchedulingConfig;
use shared_models::{AppointmentMode, AppointmentStatus};
use shared_utils::{Clock, SystemClock};

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Preview booking slots and appointment rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the slots a provider offers on a date
    Slots {
        /// Provider or doctor availability JSON file
        #[arg(long)]
        availability: PathBuf,
        /// Existing appointments JSON file (optional)
        #[arg(long)]
        appointments: Option<PathBuf>,
        /// Date to preview (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// clinic or video
        #[arg(long, default_value = "clinic")]
        mode: AppointmentMode,
        /// Override today's date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Report configuration issues in an availability file
    Validate {
        /// Provider or doctor availability JSON file
        #[arg(long)]
        availability: PathBuf,
    },
    /// Print the appointment status transition table
    Transitions {
        /// Only show transitions out of this status
        #[arg(long)]
        from: Option<AppointmentStatus>,
    },
}

fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SchedulingConfig::from_env();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Slots {
            availability,
            appointments,
            date,
            mode,
            today,
        } => {
            let today = today.unwrap_or_else(|| SystemClock.today());
            info!("Previewing {} slots for {} (today {})", mode, date, today);
            commands::slots(
                &config,
                &availability,
                appointments.as_deref(),
                date,
                mode,
                today,
            )?
        }
        Commands::Validate { availability } => commands::validate(&config, &availability)?,
        Commands::Transitions { from } => commands::transitions(from),
    };

    println!("{}", output);
    Ok(())
}
