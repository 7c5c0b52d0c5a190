//! Pipe centerlines to IFC swept-disk solids.
//!
//! The core is two pure transforms: [`adjust_path`] carves an approach and departure point
//! around every interior vertex of a centerline so the bend can be swept as an arc, and
//! [`to_millimeters`] rescales the result into the integer units the model is written in.
//! [`convert()`] drives both over a [`PipeLayer`] and hands each prepared pipe to a
//! [`SweepBuilder`]. File formats live behind the `io` feature.
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod attributes;
mod convert;
mod error;
mod fillet;
#[cfg(feature = "io")]
pub mod io;
mod point;
mod polyline;
mod units;

pub use attributes::*;
pub use convert::*;
pub use error::*;
pub use fillet::*;
pub use point::*;
pub use polyline::*;
pub use units::*;

#[cfg(test)]
#[derive(Clone, Debug)]
struct CenterlineGen {
    pub points: Vec<Point3>,
}

/// Generates centerlines without degenerate segments, coordinates within a few kilometres.
#[cfg(test)]
impl quickcheck::Arbitrary for CenterlineGen {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let n = 2 + usize::arbitrary(g) % 12;
        let mut c = || (i16::arbitrary(g) as f64) * 0.125;
        let mut points: Vec<Point3> = Vec::with_capacity(n);
        while points.len() < n {
            let p = [c(), c(), c()];
            if points.last().map_or(true, |&l| p.sub(l).mag() > 1.0) {
                points.push(p);
            }
        }
        Self { points }
    }
}
