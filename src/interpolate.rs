//! Curve interpolation
//!
//! Stop lookup, interpolation factors and typed blending of curve outputs.

use serde_json::json;

use crate::error::RuntimeError;
use crate::value::{number_to_json, Color, Value};

/// How a curve moves between two adjacent stops.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpolation {
    Step,
    Linear,
    Exponential { base: f64 },
    CubicBezier(UnitBezier),
}
impl Interpolation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Linear => "linear",
            Self::Exponential { .. } => "exponential",
            Self::CubicBezier(_) => "cubic-bezier",
        }
    }

    /// The interpolation factor in `0..=1` of `input` between `lower` and
    /// `upper`. Step curves never blend, so their factor is always zero.
    pub fn factor(&self, input: f64, lower: f64, upper: f64) -> f64 {
        match self {
            Self::Step => 0.0,
            Self::Linear => exponential_factor(input, 1.0, lower, upper),
            Self::Exponential { base } => exponential_factor(input, *base, lower, upper),
            Self::CubicBezier(bezier) => {
                bezier.solve(exponential_factor(input, 1.0, lower, upper), 1e-6)
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Step => json!(["step"]),
            Self::Linear => json!(["linear"]),
            Self::Exponential { base } => json!(["exponential", number_to_json(*base)]),
            Self::CubicBezier(b) => {
                let [x1, y1, x2, y2] = b.control_points();
                json!([
                    "cubic-bezier",
                    number_to_json(x1),
                    number_to_json(y1),
                    number_to_json(x2),
                    number_to_json(y2)
                ])
            }
        }
    }
}

/// The factor for exponential interpolation; a base of 1 is linear.
pub fn exponential_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    let progress = input - lower;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

/// A cubic bezier easing curve from (0, 0) to (1, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct UnitBezier {
    p1x: f64,
    p1y: f64,
    p2x: f64,
    p2y: f64,
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}
impl UnitBezier {
    pub fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        let cx = 3.0 * p1x;
        let bx = 3.0 * (p2x - p1x) - cx;
        let cy = 3.0 * p1y;
        let by = 3.0 * (p2y - p1y) - cy;
        Self {
            p1x,
            p1y,
            p2x,
            p2y,
            ax: 1.0 - cx - bx,
            bx,
            cx,
            ay: 1.0 - cy - by,
            by,
            cy,
        }
    }

    pub fn control_points(&self) -> [f64; 4] {
        [self.p1x, self.p1y, self.p2x, self.p2y]
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Find the curve parameter whose x coordinate is `x`: a few Newton
    /// iterations, then bisection if they fail to converge.
    fn solve_x(&self, x: f64, epsilon: f64) -> f64 {
        let mut t2 = x;
        for _ in 0..8 {
            let x2 = self.sample_x(t2) - x;
            if x2.abs() < epsilon {
                return t2;
            }
            let d2 = self.sample_derivative_x(t2);
            if d2.abs() < 1e-6 {
                break;
            }
            t2 -= x2 / d2;
        }

        let mut t0 = 0.0;
        let mut t1 = 1.0;
        t2 = x;
        if t2 < t0 {
            return t0;
        }
        if t2 > t1 {
            return t1;
        }
        while t0 < t1 {
            let x2 = self.sample_x(t2);
            if (x2 - x).abs() < epsilon {
                return t2;
            }
            if x > x2 {
                t0 = t2;
            } else {
                t1 = t2;
            }
            t2 = (t1 - t0) * 0.5 + t0;
            if (t1 - t0).abs() < f64::EPSILON {
                break;
            }
        }
        t2
    }

    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        self.sample_y(self.solve_x(x, epsilon))
    }
}

/// Returns the index of the last stop <= input, or 0 if it doesn't exist.
///
/// Inputs outside the stops, and degenerate stop lists, still produce an
/// in-range index.
pub fn find_stop_less_than_or_equal_to(stops: &[f64], input: f64) -> usize {
    let n = stops.len() as isize;
    let mut lower: isize = 0;
    let mut upper: isize = n - 1;
    let mut current: isize = 0;

    while lower <= upper {
        current = (lower + upper) / 2;
        let current_value = stops[current as usize];
        let below_next = stops
            .get(current as usize + 1)
            .map_or(false, |next| input < *next);
        if input == current_value || (input > current_value && below_next) {
            return current as usize;
        } else if current_value < input {
            lower = current + 1;
        } else if current_value > input {
            upper = current - 1;
        } else {
            // unordered input (NaN)
            break;
        }
    }

    (current - 1).max(0) as usize
}

pub fn number(from: f64, to: f64, t: f64) -> f64 {
    from * (1.0 - t) + to * t
}

pub fn color(from: &Color, to: &Color, t: f64) -> Color {
    let (from, to) = (from.to_array(), to.to_array());
    Color::from_array([
        number(from[0], to[0], t),
        number(from[1], to[1], t),
        number(from[2], to[2], t),
        number(from[3], to[3], t),
    ])
}

pub fn array(from: &[Value], to: &[Value], t: f64) -> Result<Vec<Value>, RuntimeError> {
    if from.len() != to.len() {
        return Err(RuntimeError::new(format!(
            "Cannot interpolate between arrays of length {} and {}.",
            from.len(),
            to.len()
        )));
    }
    from.iter()
        .zip(to.iter())
        .map(|pair| match pair {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(number(*a, *b, t))),
            (a, b) => Err(RuntimeError::new(format!(
                "Cannot interpolate between {} and {}.",
                a, b
            ))),
        })
        .collect()
}

#[cfg(test)]
mod test_interpolate {
    use super::*;

    #[test]
    fn test_find_stop() {
        let stops = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(find_stop_less_than_or_equal_to(&stops, 0.0), 0);
        assert_eq!(find_stop_less_than_or_equal_to(&stops, 5.0), 0);
        assert_eq!(find_stop_less_than_or_equal_to(&stops, 10.0), 1);
        assert_eq!(find_stop_less_than_or_equal_to(&stops, 25.0), 2);
        assert_eq!(find_stop_less_than_or_equal_to(&stops, 30.0), 3);
        assert_eq!(find_stop_less_than_or_equal_to(&stops, -5.0), 0);
    }

    #[test]
    fn test_find_stop_tolerates_degenerate_stops() {
        let stops = [1.0, 1.0, 1.0];
        let idx = find_stop_less_than_or_equal_to(&stops, 2.0);
        assert!(idx < stops.len());
        assert_eq!(find_stop_less_than_or_equal_to(&[5.0], 1.0), 0);
        assert_eq!(find_stop_less_than_or_equal_to(&[0.0, 1.0], f64::NAN), 0);
    }

    #[test]
    fn test_exponential_factor() {
        assert_eq!(exponential_factor(5.0, 1.0, 0.0, 10.0), 0.5);
        assert_eq!(exponential_factor(5.0, 2.0, 5.0, 5.0), 0.0);
        let t = exponential_factor(1.0, 2.0, 0.0, 2.0);
        assert!((t - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bezier_endpoints_and_linear() {
        let linear = UnitBezier::new(0.0, 0.0, 1.0, 1.0);
        assert!((linear.solve(0.25, 1e-6) - 0.25).abs() < 1e-4);
        let ease = UnitBezier::new(0.42, 0.0, 0.58, 1.0);
        assert!(ease.solve(0.0, 1e-6).abs() < 1e-6);
        assert!((ease.solve(1.0, 1e-6) - 1.0).abs() < 1e-6);
        assert!((ease.solve(0.5, 1e-6) - 0.5).abs() < 1e-4);
        assert!(ease.solve(0.2, 1e-6) < 0.2);
    }

    #[test]
    fn test_blending() {
        assert_eq!(number(0.0, 10.0, 0.25), 2.5);
        let c = color(&Color::new(0.0, 0.0, 0.0, 1.0), &Color::new(1.0, 0.5, 0.0, 0.0), 0.5);
        assert_eq!(c, Color::new(0.5, 0.25, 0.0, 0.5));
        let arr = array(
            &[Value::Number(0.0), Value::Number(2.0)],
            &[Value::Number(10.0), Value::Number(4.0)],
            0.5,
        )
        .unwrap();
        assert_eq!(arr, vec![Value::Number(5.0), Value::Number(3.0)]);
        assert!(array(&[Value::Number(0.0)], &[], 0.5).is_err());
    }
}
