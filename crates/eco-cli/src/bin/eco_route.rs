//! Query an eco-routing server from the command line.
//!
//! Usage:
//!   eco-route route 43.2380 76.9456 43.2022 76.8933 --profile air-first
//!   eco-route config
//!   eco-route health

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use eco_cli::{report, EcoClient};
use eco_core::{Coordinate, Profile, RoutingRequest};

#[derive(Parser, Debug)]
#[command(author, version, about = "Eco-aware route queries")]
struct Args {
    /// Eco-routing server URL
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank routes between two points
    Route {
        #[arg(allow_hyphen_values = true)]
        start_lat: f64,
        #[arg(allow_hyphen_values = true)]
        start_lng: f64,
        #[arg(allow_hyphen_values = true)]
        end_lat: f64,
        #[arg(allow_hyphen_values = true)]
        end_lng: f64,

        /// time-first, balanced or air-first
        #[arg(long, default_value = "balanced")]
        profile: Profile,

        /// Departure time (RFC 3339); defaults to now on the server
        #[arg(long)]
        departure: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// Show profile weights, thresholds and cache TTLs
    Config,
    /// Check road and air-quality provider status
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = EcoClient::new(&args.url);

    match args.command {
        Command::Route {
            start_lat,
            start_lng,
            end_lat,
            end_lng,
            profile,
            departure,
            json,
        } => {
            let mut request = RoutingRequest::new(
                Coordinate::new(start_lat, start_lng),
                Coordinate::new(end_lat, end_lng),
                profile,
            );
            request.validate()?;
            if let Some(departure) = departure {
                let parsed = DateTime::parse_from_rfc3339(&departure)
                    .with_context(|| format!("invalid departure time {:?}", departure))?;
                request.departure_time = Some(parsed.with_timezone(&Utc));
            }

            let response = client.route(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", report::render(&response));
            }
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&client.config().await?)?);
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            if health["status"] != "ok" {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
