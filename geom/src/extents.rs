use std::fmt;

use crate::{GeomError, Position};

// The two axes are deliberately read "backwards" relative to GeoJSON's [x, y] order: axis A is
// the second component of every position and axis B is the first. Stored tiles and query tiles
// must go through the same accessors, or matches silently go wrong.

/// The value of a position along axis A, which is the position's second component.
pub fn axis_a(pos: &[f64]) -> Result<f64, GeomError> {
    component(pos, 1)
}

/// The value of a position along axis B, which is the position's first component.
pub fn axis_b(pos: &[f64]) -> Result<f64, GeomError> {
    component(pos, 0)
}

fn component(pos: &[f64], idx: usize) -> Result<f64, GeomError> {
    match pos.get(idx) {
        Some(x) if x.is_finite() => Ok(*x),
        Some(x) => Err(GeomError::malformed(format!(
            "position {:?} has non-finite component {}",
            pos, x
        ))),
        None => Err(GeomError::malformed(format!(
            "position {:?} is missing component {}",
            pos, idx
        ))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    A,
    B,
}

impl Axis {
    /// In the order the overlap resolver narrows candidates.
    pub const ALL: [Axis; 2] = [Axis::A, Axis::B];
}

/// A closed interval along one axis. `min <= max` always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(x1: f64, x2: f64) -> Interval {
        Interval {
            min: x1.min(x2),
            max: x1.max(x2),
        }
    }

    pub fn point(x: f64) -> Interval {
        Interval { min: x, max: x }
    }

    pub fn update(&mut self, x: f64) {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Closed intervals overlap when neither lies strictly beyond the other. Touching endpoints
    /// count.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// The axis-aligned bounding box of a ring, split per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub a: Interval,
    pub b: Interval,
}

impl Extents {
    /// Takes the min and max of every position along both axes. Fails on an empty ring, or if
    /// any position lacks a usable component.
    pub fn from_ring(ring: &[Position]) -> Result<Extents, GeomError> {
        let (first, rest) = ring.split_first().ok_or(GeomError::EmptyGeometry)?;
        let mut extents = Extents {
            a: Interval::point(axis_a(first)?),
            b: Interval::point(axis_b(first)?),
        };
        for pos in rest {
            extents.a.update(axis_a(pos)?);
            extents.b.update(axis_b(pos)?);
        }
        Ok(extents)
    }

    pub fn interval(&self, axis: Axis) -> &Interval {
        match axis {
            Axis::A => &self.a,
            Axis::B => &self.b,
        }
    }

    /// True if the two boxes overlap on both axes.
    pub fn intersects(&self, other: &Extents) -> bool {
        Axis::ALL
            .iter()
            .all(|axis| self.interval(*axis).overlaps(other.interval(*axis)))
    }
}

impl fmt::Display for Extents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Extents(a: [{}, {}], b: [{}, {}])",
            self.a.min, self.a.max, self.b.min, self.b.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(pts: &[(f64, f64)]) -> Vec<Position> {
        pts.iter().map(|(x, y)| vec![*x, *y]).collect()
    }

    #[test]
    fn axes_are_swapped() {
        let pos = vec![3.0, 7.0];
        assert_eq!(axis_a(&pos), Ok(7.0));
        assert_eq!(axis_b(&pos), Ok(3.0));
    }

    #[test]
    fn extents_of_a_ring() {
        let e = Extents::from_ring(&ring(&[
            (77.5, 12.9),
            (77.7, 12.9),
            (77.7, 13.1),
            (77.5, 13.1),
            (77.5, 12.9),
        ]))
        .unwrap();
        assert_eq!(e.a.min, 12.9);
        assert_eq!(e.a.max, 13.1);
        assert_eq!(e.b.min, 77.5);
        assert_eq!(e.b.max, 77.7);
        assert_eq!(e.interval(Axis::B), &e.b);
    }

    #[test]
    fn extra_components_are_ignored() {
        let e = Extents::from_ring(&[vec![1.0, 2.0, 500.0], vec![3.0, 4.0, -10.0]]).unwrap();
        assert_eq!(e.a, Interval::new(2.0, 4.0));
        assert_eq!(e.b, Interval::new(1.0, 3.0));
    }

    #[test]
    fn single_point_ring() {
        let e = Extents::from_ring(&ring(&[(4.0, 2.0)])).unwrap();
        assert_eq!(e.a, Interval::point(2.0));
        assert_eq!(e.b, Interval::point(4.0));
    }

    #[test]
    fn empty_ring() {
        assert_eq!(Extents::from_ring(&[]), Err(GeomError::EmptyGeometry));
    }

    #[test]
    fn malformed_positions() {
        for bad in [vec![1.0], vec![], vec![f64::NAN, 1.0], vec![1.0, f64::INFINITY]] {
            let result = Extents::from_ring(&[vec![0.0, 0.0], bad.clone()]);
            assert!(
                matches!(result, Err(GeomError::MalformedGeometry(_))),
                "{:?} gave {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn interval_overlap() {
        let unit = Interval::new(0.0, 1.0);
        assert!(unit.overlaps(&unit));
        assert!(unit.overlaps(&Interval::new(0.5, 1.5)));
        assert!(unit.overlaps(&Interval::new(1.0, 2.0)));
        assert!(unit.overlaps(&Interval::new(-5.0, 5.0)));
        assert!(!unit.overlaps(&Interval::new(1.1, 2.0)));
        assert!(!unit.overlaps(&Interval::new(-2.0, -0.1)));
        assert!(unit.overlaps(&Interval::point(0.0)));
        assert!(!unit.overlaps(&Interval::point(-0.0001)));
    }

    #[test]
    fn interval_new_orders_endpoints() {
        let i = Interval::new(5.0, -1.0);
        assert_eq!(i.min, -1.0);
        assert_eq!(i.max, 5.0);
    }
}
