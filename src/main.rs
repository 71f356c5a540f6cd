use anyhow::Result;
use clap::Parser;

use road_sim::simulation::{Direction, Mode, RoadConfig, RoadNetwork, TilePos};

#[derive(Parser)]
#[command(name = "road_sim")]
#[command(about = "Headless road traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for the random source; omit for an OS-seeded run
    #[arg(long)]
    seed: Option<u64>,

    /// Tick at which to stop traffic at the road's center column
    #[arg(long)]
    stop_at: Option<u32>,

    /// Tick at which to resume stopped traffic
    #[arg(long)]
    start_at: Option<u32>,

    /// Tick at which to trigger a crash at the road's center
    #[arg(long)]
    crash_at: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    println!("Running road traffic simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);

    let config = RoadConfig::default();
    // Control events land in the middle of the road's tile rectangle.
    let center = TilePos::new(
        config.tile_rect.x + config.tile_rect.w / 2,
        config.tile_rect.y + config.tile_rect.h / 2,
    );

    let mut network = match cli.seed {
        Some(seed) => RoadNetwork::new_with_seed(config, seed)?,
        None => RoadNetwork::new(config)?,
    };

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = (1.0 / cli.delta).ceil().max(1.0) as u32;

    println!("Initial state:");
    print_summary(&network);
    draw_map(&network);
    println!();

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            if cli.stop_at == Some(tick) {
                network.stop(center);
            }
            if cli.start_at == Some(tick) {
                network.start(center);
            }
            if cli.crash_at == Some(tick) {
                network.crash(center);
            }
            network.update(cli.delta);
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * cli.delta
        );
        print_summary(&network);
        draw_map(&network);
        println!();
    }

    println!("=== Final State ===");
    print_summary(&network);
    draw_map(&network);
    Ok(())
}

/// Print a one-screen status summary of the road
fn print_summary(network: &RoadNetwork) {
    println!("=== Road Traffic Summary ===");
    println!("Time: {:.2}s", network.time());
    println!(
        "Cars: {}, blocked tiles: {}",
        network.cars().count(),
        network.occupancy().blocked_tiles().count()
    );
    for lane in network.lanes() {
        let stop = match lane.stop_x {
            Some(x) => format!("{:.1}", x),
            None => "-".to_string(),
        };
        println!(
            "  Lane {}: {:?} {:?}, stop_x={}, cars={}",
            lane.index,
            lane.dir,
            lane.mode,
            stop,
            lane.cars.len()
        );
    }
}

/// Draw the road as ASCII art: one character per tile column, one lane per
/// row. Cars show their travel direction, X marks a blocked tile.
fn draw_map(network: &RoadNetwork) {
    let config = network.config();
    let (tw, _) = config.tile_size;
    let rect = config.tile_rect;
    let width = rect.w.max(0) as usize;

    for lane in network.lanes() {
        let mut row = vec!['.'; width];

        let lane_rows: Vec<i32> = (rect.y..rect.y + rect.h)
            .filter(|&tile_row| {
                let (lo, hi) = (
                    tile_row as f32 * config.tile_size.1,
                    (tile_row + 1) as f32 * config.tile_size.1,
                );
                let half = config.lane_width / 2.0;
                lane.center_y - half < hi && lane.center_y + half > lo
            })
            .collect();

        for pos in network.occupancy().blocked_tiles() {
            if lane_rows.contains(&pos.y) && pos.x >= rect.x && pos.x < rect.x + rect.w {
                row[(pos.x - rect.x) as usize] = 'X';
            }
        }

        let glyph = match lane.dir {
            Direction::Right => '>',
            Direction::Left => '<',
        };
        for car in &lane.cars {
            let col = ((car.x + car.length / 2.0) / tw).floor() as i32 - rect.x;
            if col >= 0 && (col as usize) < width && car.mode == Mode::Moving {
                row[col as usize] = glyph;
            }
        }

        println!("  |{}|", row.iter().collect::<String>());
    }
}
