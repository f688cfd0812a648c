//! Least-squares primitives fitted to a single joint's samples.

use nalgebra::{Matrix3, SymmetricEigen, Unit, Vector3};

/// Centroid and principal directions of a point set.
///
/// `spreads` are RMS distances along each direction (square roots of the
/// covariance eigenvalues), ascending; `directions[i]` pairs with
/// `spreads[i]`.
#[derive(Debug, Clone)]
pub(crate) struct PrincipalAxes {
    pub centroid: Vector3<f64>,
    pub spreads: [f64; 3],
    pub directions: [Unit<Vector3<f64>>; 3],
}

impl PrincipalAxes {
    /// `points` must be non-empty.
    pub fn new(points: &[Vector3<f64>]) -> Self {
        let n = points.len() as f64;
        let centroid = points.iter().sum::<Vector3<f64>>() / n;
        let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
            let d = p - centroid;
            acc + d * d.transpose()
        }) / n;

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

        Self {
            centroid,
            spreads: order.map(|i| eigen.eigenvalues[i].max(0.0).sqrt()),
            directions: order.map(|i| Unit::new_normalize(eigen.eigenvectors.column(i).into_owned())),
        }
    }

    pub fn largest_spread(&self) -> f64 {
        self.spreads[2]
    }

    pub fn middle_spread(&self) -> f64 {
        self.spreads[1]
    }

    /// Normal of the best-fit plane.
    pub fn normal(&self) -> Unit<Vector3<f64>> {
        self.directions[0]
    }

    /// Direction of the best-fit line.
    pub fn principal(&self) -> Unit<Vector3<f64>> {
        self.directions[2]
    }
}

// ---------------------------------------------------------------------------
// Circle
// ---------------------------------------------------------------------------

/// A circle in 3D.
#[derive(Debug, Clone)]
pub(crate) struct Circle {
    pub center: Vector3<f64>,
    pub normal: Unit<Vector3<f64>>,
    pub radius: f64,
}

impl Circle {
    /// Fit a circle to points lying near the plane of `axes`.
    ///
    /// Points are projected into the plane and fitted algebraically
    /// (`x² + y² + Dx + Ey + F = 0`). `None` if the normal equations are
    /// singular or the radius is not real.
    pub fn fit(points: &[Vector3<f64>], axes: &PrincipalAxes) -> Option<Self> {
        let normal = axes.normal();
        let u = axes.principal().into_inner();
        let v = normal.cross(&u);

        let mut ata = Matrix3::zeros();
        let mut atb = Vector3::zeros();
        for p in points {
            let d = p - axes.centroid;
            let (x, y) = (d.dot(&u), d.dot(&v));
            let row = Vector3::new(x, y, 1.0);
            ata += row * row.transpose();
            atb -= row * (x * x + y * y);
        }

        let solution = ata.lu().solve(&atb)?;
        let (a, b) = (-0.5 * solution.x, -0.5 * solution.y);
        let radius_sq = a * a + b * b - solution.z;
        if !(radius_sq.is_finite() && radius_sq > 0.0) {
            return None;
        }

        Some(Self {
            center: axes.centroid + u * a + v * b,
            normal,
            radius: radius_sq.sqrt(),
        })
    }

    /// `p` minus the closest point on the circle.
    pub fn residual(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let d = p - self.center;
        let radial = d - self.normal.into_inner() * d.dot(&self.normal);
        let norm = radial.norm();
        let toward = if norm > f64::EPSILON {
            radial / norm
        } else {
            // on the axis: every circle point is equally close
            any_perpendicular(&self.normal)
        };
        d - toward * self.radius
    }
}

fn any_perpendicular(n: &Unit<Vector3<f64>>) -> Vector3<f64> {
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    n.cross(&helper).normalize()
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// An infinite line through `origin`.
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub origin: Vector3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Line {
    /// Best-fit line: principal direction through the centroid, which is
    /// also the line point closest to the centroid.
    pub fn fit(axes: &PrincipalAxes) -> Self {
        Self {
            origin: axes.centroid,
            direction: axes.principal(),
        }
    }

    /// Perpendicular offset of `p` from the line.
    pub fn residual(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let d = p - self.origin;
        d - self.direction.into_inner() * d.dot(&self.direction)
    }
}
