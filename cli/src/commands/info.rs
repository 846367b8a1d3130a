use anyhow::Result;
use lanebuffer::geo::Geometry;
use lanebuffer::{io, FieldType};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::InfoArgs) -> Result<()> {
    let layer = io::read_layer(&args.layer)?;

    println!("layer: {}", layer.name);
    match layer.epsg {
        Some(epsg) => println!("crs: EPSG:{epsg}"),
        None => println!("crs: unknown"),
    }

    println!("fields:");
    for field in &layer.fields {
        let ty = match field.ty {
            FieldType::Float => "float",
            FieldType::Int => "int",
            FieldType::Text => "text",
        };
        println!("  {} ({ty})", field.name);
    }

    let mut lines = 0usize;
    let mut polygons = 0usize;
    let mut other = 0usize;
    for feature in &layer.features {
        match feature.geometry {
            Geometry::LineString(_) | Geometry::MultiLineString(_) => lines += 1,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => polygons += 1,
            _ => other += 1,
        }
    }
    println!("features: {} ({lines} line, {polygons} polygon, {other} other)", layer.len());
    Ok(())
}
