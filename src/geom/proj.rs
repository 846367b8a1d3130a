use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj4rs::{proj::Proj, transform::transform};

/// PROJ.4 definitions for the coordinate systems the merge step understands.
/// Geographic sources plus the Israeli TM Grid target.
fn proj4_definition(epsg: u32) -> Result<&'static str> {
    match epsg {
        4326 => Ok("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
        4269 => Ok("+proj=longlat +datum=NAD83 +no_defs +type=crs"),
        2039 => Ok(concat!(
            "+proj=tmerc +lat_0=31.7343936111111 +lon_0=35.2045169444444 ",
            "+k=1.0000067 +x_0=219529.584 +y_0=626907.39 +ellps=GRS80 ",
            "+towgs84=-48,55,52,0,0,0,0 +units=m +no_defs +type=crs"
        )),
        other => bail!("no PROJ.4 definition for EPSG:{other}"),
    }
}

/// Geographic systems carry degrees; everything else is already linear units.
#[inline]
fn is_geographic(epsg: u32) -> bool {
    matches!(epsg, 4326 | 4269)
}

/// Reproject a geometry between two known EPSG codes.
/// Degrees <-> radians conversions are handled here; `proj4rs` works in
/// radians for geographic systems.
pub(crate) fn reproject(geometry: &Geometry<f64>, from_epsg: u32, to_epsg: u32) -> Result<Geometry<f64>> {
    if from_epsg == to_epsg {
        return Ok(geometry.clone());
    }

    let from = Proj::from_proj_string(proj4_definition(from_epsg)?)
        .with_context(|| format!("failed to build source PROJ.4 for EPSG:{from_epsg}"))?;
    let to = Proj::from_proj_string(proj4_definition(to_epsg)?)
        .with_context(|| format!("failed to build target PROJ.4 for EPSG:{to_epsg}"))?;

    let (src_geog, dst_geog) = (is_geographic(from_epsg), is_geographic(to_epsg));
    geometry.try_map_coords(|coord: Coord<f64>| {
        let mut point = if src_geog {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&from, &to, &mut point)
            .map_err(|e| anyhow!("CRS transform EPSG:{from_epsg} -> EPSG:{to_epsg} failed: {e}"))?;
        Ok(if dst_geog {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    })
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};

    use super::reproject;

    #[test]
    fn identity_when_source_equals_target() {
        let point = Geometry::Point(Point::new(200000.0, 600000.0));
        let out = reproject(&point, 2039, 2039).unwrap();
        assert_eq!(out, point);
    }

    #[test]
    fn wgs84_origin_lands_near_the_tm_grid_false_origin() {
        // The projection center maps onto (x_0, y_0) up to the datum shift.
        let point = Geometry::Point(Point::new(35.2045169444444, 31.7343936111111));
        let out = reproject(&point, 4326, 2039).unwrap();
        let Geometry::Point(p) = out else { panic!("expected a point") };
        assert!((p.x() - 219529.584).abs() < 500.0, "x = {}", p.x());
        assert!((p.y() - 626907.39).abs() < 500.0, "y = {}", p.y());
    }

    #[test]
    fn unknown_source_crs_is_an_error() {
        let point = Geometry::Point(Point::new(0.0, 0.0));
        assert!(reproject(&point, 3857, 2039).is_err());
    }
}
