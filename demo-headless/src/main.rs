use clap::Parser;
use ozone_sim_core::config::load_sections;
use ozone_sim_core::{ScenarioConfig, TransportError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Ozone transport demo over a configured or built-in region
#[derive(Parser, Debug)]
#[command(name = "ozone-demo")]
#[command(about = "Ozone advection-diffusion over a road network", long_about = None)]
struct Args {
    /// Section configuration file (defaults to the Salt Lake Valley scenario)
    config: Option<PathBuf>,

    /// Override the number of steps
    #[arg(short, long)]
    steps: Option<usize>,

    /// Override the step duration in hours
    #[arg(long)]
    dt: Option<f64>,

    /// Print a report every N steps
    #[arg(short, long, default_value_t = 1)]
    report_interval: usize,

    /// Also print the ground-level field at the end
    #[arg(short, long)]
    ground: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), TransportError> {
    println!("=== Ozone Transport Demo ===\n");

    let mut scenario = match &args.config {
        Some(path) => {
            println!("Loading scenario from {}", path.display());
            ScenarioConfig::from_sections(&load_sections(path)?)?
        }
        None => {
            println!("Using built-in Salt Lake Valley scenario");
            ScenarioConfig::salt_lake_valley()
        }
    };
    if let Some(steps) = args.steps {
        scenario.steps = steps;
    }
    if let Some(dt) = args.dt {
        scenario.dt = dt;
    }

    let network = scenario.road_network()?;
    for (n, road) in network.iter().enumerate() {
        println!(
            "Road {}: {} ({:.0}, {:.0}) -> ({:.0}, {:.0})",
            n + 1,
            road.name().unwrap_or("unnamed"),
            road.start().x,
            road.start().y,
            road.end().x,
            road.end().y
        );
    }
    if let Some(extent) = network.bounds() {
        println!(
            "Road extent: north-south {:?}, west-east {:?}",
            extent.north_south, extent.west_east
        );
    }

    let mut model = scenario.build_model()?;
    let dims = model.dimensions();
    let params = *model.params();
    println!(
        "Grid: {}x{}x{} cells, {} road(s)",
        dims.nx,
        dims.ny,
        dims.nz,
        model.source_count()
    );
    println!(
        "Wind: ({:.2}, {:.2}, {:.2}), D: {:.3}, top: {:?}",
        params.u, params.v, params.w, params.diffusion, params.top_boundary
    );
    let stability = model.stability(scenario.dt);
    println!(
        "Positivity margin at dt={}: {:.4}\n",
        scenario.dt,
        stability.positivity_margin()
    );

    println!(" Step |  Time | Total ozone | Peak cell");
    println!("------|-------|-------------|----------");
    let interval = args.report_interval.max(1);
    for n in 1..=scenario.steps {
        model.step(scenario.dt)?;
        if n % interval == 0 || n == scenario.steps {
            println!(
                "{:5} | {:5.1} | {:11.4} | {:9.4}",
                n,
                model.current_time(),
                model.total_mass(),
                model.grid().max_value()
            );
        }
    }

    println!("\n=== Run Complete ===");
    println!("Final time: {:.1}", model.current_time());
    println!("Total ozone: {:.4}", model.total_mass());

    if args.ground {
        println!("\nGround layer (rows north-south, columns west-east):");
        let ground = model.grid().ground_layer();
        for row in ground.chunks(dims.ny) {
            let line: Vec<String> = row.iter().map(|v| format!("{v:8.3}")).collect();
            println!("{}", line.join(" "));
        }
    }

    Ok(())
}
