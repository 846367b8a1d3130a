use anyhow::Result;
use lanebuffer::{io, BufferByLanes};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::BufferArgs) -> Result<()> {
    let input = io::read_layer(&args.input)?;
    if cli.verbose > 0 {
        eprintln!(
            "[buffer] {} line features from {}",
            input.len(),
            args.input.display()
        );
    }

    let pipeline = BufferByLanes {
        lane_weight: args.lane_weight,
        sidewalk_width: args.sidewalk_width,
    };
    let (road, sidewalk) = pipeline.run(&input)?;
    if cli.verbose > 0 {
        eprintln!(
            "[buffer] {} road polygons, {} sidewalk polygons",
            road.len(),
            sidewalk.len()
        );
    }

    io::write_layer(&road, &args.road, args.force)?;
    io::write_layer(&sidewalk, &args.sidewalk, args.force)?;
    println!("Wrote {} and {}", args.road.display(), args.sidewalk.display());
    Ok(())
}
