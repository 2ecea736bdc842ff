//! Row and ground segments of the array cross-section.

use crate::error::{Error, Result};
use crate::geom::EPS;
use crate::geom::segment::{LineSegment, line_intersection};
use crate::pvarray::Side;
use crate::pvarray::config::ArrayConfig;
use crate::pvarray::sun::SunState;
use crate::pvarray::tracking::{RowPose, row_pose};
use crate::{Point, Vector};

/// One PV row. Front and back share the same endpoints with opposite normals.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGeometry {
    pub index: usize,
    pub center: Point,
    pub front: LineSegment,
    pub back: LineSegment,
}

impl RowGeometry {
    /// Segment of a row side (`None` for `Side::Ground`).
    pub fn side(&self, side: Side) -> Option<&LineSegment> {
        match side {
            Side::Front => Some(&self.front),
            Side::Back => Some(&self.back),
            Side::Ground => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.front.length()
    }

    /// Height of the lowest edge above the ground.
    pub fn lowest(&self) -> f64 {
        self.front.start.y.min(self.front.end.y)
    }
}

/// Geometry of the whole array for one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGeometry {
    pub pose: RowPose,
    pub rows: Vec<RowGeometry>,
    pub ground: LineSegment,
    /// In-plane solar vector (see [`SunState::in_plane_vector`]).
    pub sun: Vector,
    pub sun_up: bool,
}

impl ArrayGeometry {
    /// Builds rows and ground from the array parameters and the sun position.
    pub fn build(config: &ArrayConfig, sun: &SunState) -> Result<Self> {
        let pose = row_pose(config, sun);
        let normal = pose.front_normal();
        let along = pose.along();
        let half = 0.5 * config.row_width;

        let mut rows = Vec::with_capacity(config.n_rows);
        for index in 0..config.n_rows {
            let center = Point::new(config.row_center_x(index), config.row_height);
            let start = center + along * -half;
            let end = center + along * half;
            let front = LineSegment::new(start, end, normal)
                .ok_or_else(|| Error::Geometry(format!("row {index} has zero width")))?;
            let back = LineSegment::new(start, end, -normal)
                .ok_or_else(|| Error::Geometry(format!("row {index} has zero width")))?;
            let row = RowGeometry {
                index,
                center,
                front,
                back,
            };
            if row.lowest() <= EPS {
                return Err(Error::Geometry(format!(
                    "row {index} touches the ground at tilt {:.2} deg",
                    pose.tilt
                )));
            }
            rows.push(row);
        }

        let ground = LineSegment::new(
            Point::new(config.ground.min_x, 0.0),
            Point::new(config.ground.max_x, 0.0),
            Vector::new(0.0, 1.0),
        )
        .ok_or_else(|| Error::Geometry("ground has zero length".to_string()))?;

        Ok(Self {
            pose,
            rows,
            ground,
            sun: sun.in_plane_vector(config.axis_azimuth),
            sun_up: sun.is_up(),
        })
    }

    /// Cosine of the angle of incidence on a surface with the given normal.
    pub fn cos_aoi(&self, normal: Vector) -> f64 {
        self.sun.dot(normal)
    }

    /// Row side receiving direct light, if any.
    pub fn illuminated_side(&self) -> Option<Side> {
        if !self.sun_up {
            return None;
        }
        let c = self.cos_aoi(self.pose.front_normal());
        if c > EPS {
            Some(Side::Front)
        } else if c < -EPS {
            Some(Side::Back)
        } else {
            None
        }
    }

    /// Points where each row plane crosses the ground line (`None` for flat rows).
    ///
    /// The points may lie outside the modelled ground.
    pub fn plane_cut_points(&self) -> Vec<Option<Point>> {
        self.rows
            .iter()
            .map(|row| {
                let along = row.front.direction();
                line_intersection(row.front.start, along, self.ground.start, self.ground.end)
                    .map(|(s, _)| row.front.start + along * s)
            })
            .collect()
    }

    /// Endpoints of every row, used as obstacles.
    pub fn row_edges(&self) -> Vec<(Point, Point)> {
        self.rows
            .iter()
            .map(|row| (row.front.start, row.front.end))
            .collect()
    }
}
