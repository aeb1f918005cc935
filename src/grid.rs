//! # Structured staggered grid
//! Coordinates of cell centers (`x`, `y`, `z`) and cell faces
//! (`xh`, `yh`, `zh`) of a rectilinear mesh.
//!
//! Arrays sampled on the grid are indexed `[k, j, i]`, i.e. the
//! vertical axis `z` is the slowest and `x` the fastest varying axis.
//! This is the order in which the solver dumps its fields.
use crate::error::{Result, VerifyError};
use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal
    X,
    /// Homogeneous (spanwise)
    Y,
    /// Vertical
    Z,
}

/// Position of samples along one axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Cell centers (`x`, `y`, `z`)
    Center,
    /// Cell faces (`xh`, `yh`, `zh`)
    Face,
}

/// Location of a field along each axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stagger {
    /// Horizontal
    pub x: Location,
    /// Homogeneous (spanwise)
    pub y: Location,
    /// Vertical
    pub z: Location,
}

impl Stagger {
    /// Cell centered in all directions (pressure, scalars)
    pub const CENTER: Self = Self {
        x: Location::Center,
        y: Location::Center,
        z: Location::Center,
    };

    /// Velocity components live on the faces normal to their direction,
    /// everything else lives on cell centers.
    pub fn for_field(name: &str) -> Self {
        match name {
            "u" => Self {
                x: Location::Face,
                ..Self::CENTER
            },
            "v" => Self {
                y: Location::Face,
                ..Self::CENTER
            },
            "w" => Self {
                z: Location::Face,
                ..Self::CENTER
            },
            _ => Self::CENTER,
        }
    }
}

/// Grid resolution of one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Number of cells in x
    pub nx: usize,
    /// Number of cells in z
    pub nz: usize,
}

impl Resolution {
    /// Return a new resolution
    pub fn new(nx: usize, nz: usize) -> Self {
        Self { nx, nz }
    }

    /// Horizontal grid spacing of the unit-length domain, `1/nx`
    #[allow(clippy::cast_precision_loss)]
    pub fn spacing(&self) -> f64 {
        1. / self.nx as f64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.nx, self.nz)
    }
}

/// Coordinates of a rectilinear staggered grid.
///
/// Constructed once per run, immutable afterwards. All public
/// constructors validate the axes, see [`Grid::new`].
///
/// Face `i` is the face preceding center `i` (`xh[i] < x[i]`), unless
/// a face axis of the same length as its center axis is shifted by
/// half a cell, in which case face `i` follows center `i`
/// (`x[i] < xh[i]`). See [`Grid::faces_follow`].
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Cell centers x
    pub x: Array1<f64>,
    /// Cell faces x
    pub xh: Array1<f64>,
    /// Cell centers y
    pub y: Array1<f64>,
    /// Cell faces y
    pub yh: Array1<f64>,
    /// Cell centers z
    pub z: Array1<f64>,
    /// Cell faces z
    pub zh: Array1<f64>,
}

impl Grid {
    /// Return a new grid from center and face coordinates
    ///
    /// # Errors
    /// `InvalidInput` if an axis is empty, contains non-finite values, is
    /// not strictly increasing, or if faces and centers are not aligned
    /// (face axis must have the length of the center axis or one more,
    /// and faces must interleave centers).
    pub fn new(
        x: Array1<f64>,
        xh: Array1<f64>,
        y: Array1<f64>,
        yh: Array1<f64>,
        z: Array1<f64>,
        zh: Array1<f64>,
    ) -> Result<Self> {
        validate_axis("x", &x, &xh)?;
        validate_axis("y", &y, &yh)?;
        validate_axis("z", &z, &zh)?;
        Ok(Self {
            x,
            xh,
            y,
            yh,
            z,
            zh,
        })
    }

    /// Two dimensional grid, with a single point in the homogeneous
    /// direction (`y = [0.5]`, `yh = [0.0]`).
    ///
    /// # Errors
    /// See [`Grid::new`]
    pub fn new_2d(
        x: Array1<f64>,
        xh: Array1<f64>,
        z: Array1<f64>,
        zh: Array1<f64>,
    ) -> Result<Self> {
        Self::new(x, xh, Array1::from_elem(1, 0.5), Array1::zeros(1), z, zh)
    }

    /// Two dimensional set of sample coordinates for a pointwise
    /// evaluation. Only checks that every axis is non-empty and finite,
    /// ordering and alignment are not required.
    pub(crate) fn sample_points_2d(
        x: Array1<f64>,
        xh: Array1<f64>,
        z: Array1<f64>,
        zh: Array1<f64>,
    ) -> Result<Self> {
        for (name, coords) in [("x", &x), ("xh", &xh), ("z", &z), ("zh", &zh)] {
            check_finite(name, coords)?;
        }
        Ok(Self {
            x,
            xh,
            y: Array1::from_elem(1, 0.5),
            yh: Array1::zeros(1),
            z,
            zh,
        })
    }

    /// Equidistant grid on `[0, size]` in each direction.
    ///
    /// Centers sit at `(i + 1/2) * delta`, faces at `i * delta`;
    /// the face axis has the same length as the center axis.
    ///
    /// # Errors
    /// `InvalidInput` if any number of cells is zero or any size
    /// is not positive.
    pub fn uniform(nx: usize, ny: usize, nz: usize, size: [f64; 3]) -> Result<Self> {
        let (x, xh) = uniform_axis("x", nx, size[0])?;
        let (y, yh) = uniform_axis("y", ny, size[1])?;
        let (z, zh) = uniform_axis("z", nz, size[2])?;
        Self::new(x, xh, y, yh, z, zh)
    }

    /// Center or face coordinates along x
    pub fn x_at(&self, location: Location) -> &Array1<f64> {
        match location {
            Location::Center => &self.x,
            Location::Face => &self.xh,
        }
    }

    /// Center or face coordinates along y
    pub fn y_at(&self, location: Location) -> &Array1<f64> {
        match location {
            Location::Center => &self.y,
            Location::Face => &self.yh,
        }
    }

    /// Center or face coordinates along z
    pub fn z_at(&self, location: Location) -> &Array1<f64> {
        match location {
            Location::Center => &self.z,
            Location::Face => &self.zh,
        }
    }

    /// Center and face coordinates along `axis`
    pub fn axis(&self, axis: Axis) -> (&Array1<f64>, &Array1<f64>) {
        match axis {
            Axis::X => (&self.x, &self.xh),
            Axis::Y => (&self.y, &self.yh),
            Axis::Z => (&self.z, &self.zh),
        }
    }

    /// True if face `i` lies after center `i` along `axis`
    pub fn faces_follow(&self, axis: Axis) -> bool {
        let (centers, faces) = self.axis(axis);
        match (centers.get(0), faces.get(0)) {
            (Some(c), Some(f)) => c < f,
            _ => false,
        }
    }

    /// Array shape `[nz, ny, nx]` of a field with the given stagger
    pub fn shape_of(&self, stagger: Stagger) -> [usize; 3] {
        [
            self.z_at(stagger.z).len(),
            self.y_at(stagger.y).len(),
            self.x_at(stagger.x).len(),
        ]
    }

    /// Volume of the cell around each sample of a field with the given
    /// stagger.
    pub fn cell_volumes(&self, stagger: Stagger) -> Array3<f64> {
        let wx = cell_widths(self.x_at(stagger.x));
        let wy = cell_widths(self.y_at(stagger.y));
        let wz = cell_widths(self.z_at(stagger.z));
        Array3::from_shape_fn((wz.len(), wy.len(), wx.len()), |(k, j, i)| {
            wz[k] * wy[j] * wx[i]
        })
    }
}

/// Width of the cell around each coordinate.
///
/// Interior cells extend halfway to their neighbours, the first and
/// last cell are mirrored. A single point axis has unit width.
pub fn cell_widths(x: &Array1<f64>) -> Array1<f64> {
    let n = x.len();
    if n < 2 {
        return Array1::ones(n);
    }
    let two = 2.;
    let mut dx = Array1::<f64>::zeros(n);
    for (i, dxi) in dx.iter_mut().enumerate() {
        let xs_left = if i == 0 {
            x[0] - (x[1] - x[0]) / two
        } else {
            (x[i] + x[i - 1]) / two
        };
        let xs_right = if i == n - 1 {
            x[n - 1] + (x[n - 1] - x[n - 2]) / two
        } else {
            (x[i + 1] + x[i]) / two
        };
        *dxi = xs_right - xs_left;
    }
    dx
}

#[allow(clippy::cast_precision_loss)]
fn uniform_axis(name: &str, n: usize, size: f64) -> Result<(Array1<f64>, Array1<f64>)> {
    if n == 0 {
        return Err(VerifyError::InvalidInput(format!(
            "number of cells along {} must be positive",
            name
        )));
    }
    if !(size.is_finite() && size > 0.) {
        return Err(VerifyError::InvalidInput(format!(
            "domain size along {} must be positive, got {}",
            name, size
        )));
    }
    let delta = size / n as f64;
    let centers = Array1::from_shape_fn(n, |i| (i as f64 + 0.5) * delta);
    let faces = Array1::from_shape_fn(n, |i| i as f64 * delta);
    Ok((centers, faces))
}

fn check_finite(name: &str, coords: &Array1<f64>) -> Result<()> {
    if coords.is_empty() {
        return Err(VerifyError::InvalidInput(format!(
            "coordinate axis {} is empty",
            name
        )));
    }
    if let Some(v) = coords.iter().find(|v| !v.is_finite()) {
        return Err(VerifyError::InvalidInput(format!(
            "coordinate axis {} contains non-finite value {}",
            name, v
        )));
    }
    Ok(())
}

fn validate_coords(name: &str, coords: &Array1<f64>) -> Result<()> {
    check_finite(name, coords)?;
    if coords.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(VerifyError::InvalidInput(format!(
            "coordinate axis {} is not strictly increasing",
            name
        )));
    }
    Ok(())
}

fn validate_axis(name: &str, centers: &Array1<f64>, faces: &Array1<f64>) -> Result<()> {
    validate_coords(name, centers)?;
    validate_coords(&format!("{}h", name), faces)?;
    let (nc, nf) = (centers.len(), faces.len());
    if nf != nc && nf != nc + 1 {
        return Err(VerifyError::InvalidInput(format!(
            "axis {}: {} faces do not match {} centers",
            name, nf, nc
        )));
    }
    let aligned = interleaves(faces, centers) || (nf == nc && interleaves(centers, faces));
    if !aligned {
        return Err(VerifyError::InvalidInput(format!(
            "axis {}: faces do not interleave centers",
            name
        )));
    }
    Ok(())
}

/// `a[i] < b[i] < a[i+1]` wherever the indices exist
fn interleaves(a: &Array1<f64>, b: &Array1<f64>) -> bool {
    b.iter().enumerate().all(|(i, bi)| {
        let lower = a.get(i).map_or(true, |ai| ai < bi);
        let upper = a.get(i + 1).map_or(true, |ai| bi < ai);
        lower && upper
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::approx_eq;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_uniform_grid() {
        let grid = Grid::uniform(4, 1, 2, [1., 1., 0.5]).unwrap();
        approx_eq(&grid.x, &array![0.125, 0.375, 0.625, 0.875]);
        approx_eq(&grid.xh, &array![0., 0.25, 0.5, 0.75]);
        approx_eq(&grid.z, &array![0.125, 0.375]);
        approx_eq(&grid.zh, &array![0., 0.25]);
        assert_eq!(grid.y.len(), 1);
        assert_eq!(grid.shape_of(Stagger::for_field("u")), [2, 1, 4]);
    }

    #[test]
    fn test_faces_may_have_one_more_entry() {
        let grid = Grid::new_2d(
            array![0.25, 0.75],
            array![0., 0.5],
            array![0.25, 0.75],
            array![0., 0.5, 1.0],
        )
        .unwrap();
        assert_eq!(grid.shape_of(Stagger::for_field("w")), [3, 1, 2]);
        assert_eq!(grid.shape_of(Stagger::CENTER), [2, 1, 2]);
    }

    #[test]
    fn test_rejects_malformed_axes() {
        let ok = array![0.25, 0.75];
        let faces = array![0., 0.5];
        let empty = Array1::<f64>::zeros(0);
        let nan = array![0.25, f64::NAN];
        let decreasing = array![0.75, 0.25];
        let unaligned = array![0.5, 0.6];
        let too_many = array![0., 0.3, 0.6, 0.9];
        for bad in [&empty, &nan, &decreasing] {
            let res = Grid::new_2d(bad.clone(), faces.clone(), ok.clone(), faces.clone());
            assert!(matches!(res, Err(VerifyError::InvalidInput(_))));
        }
        for bad in [&unaligned, &too_many] {
            let res = Grid::new_2d(ok.clone(), bad.clone(), ok.clone(), faces.clone());
            assert!(matches!(res, Err(VerifyError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_faces_follow() {
        let uniform = Grid::uniform(4, 1, 2, [1., 1., 0.5]).unwrap();
        assert!(!uniform.faces_follow(Axis::X));
        assert!(!uniform.faces_follow(Axis::Z));
        let shifted = Grid::new_2d(
            array![0.125, 0.375, 0.625, 0.875],
            array![0.25, 0.5, 0.75, 1.],
            array![0.25, 0.75],
            array![0., 0.5, 1.],
        )
        .unwrap();
        assert!(shifted.faces_follow(Axis::X));
        assert!(!shifted.faces_follow(Axis::Z));
        assert_eq!(shifted.axis(Axis::Z).1.len(), 3);
    }

    #[test]
    fn test_sample_points_need_only_finite_values() {
        let one = array![0.25];
        let grid =
            Grid::sample_points_2d(one.clone(), one.clone(), array![0.7, 0.2], one.clone())
                .unwrap();
        assert_eq!(grid.shape_of(Stagger::CENTER), [2, 1, 1]);
        let res = Grid::sample_points_2d(one.clone(), array![f64::NAN], one.clone(), one.clone());
        assert!(matches!(res, Err(VerifyError::InvalidInput(_))));
        let res = Grid::sample_points_2d(one.clone(), one.clone(), Array1::zeros(0), one);
        assert!(matches!(res, Err(VerifyError::InvalidInput(_))));
    }

    #[test]
    fn test_cell_widths() {
        let w = cell_widths(&array![0.5, 1.5, 2.5, 3.5]);
        approx_eq(&w, &array![1., 1., 1., 1.]);
        let w = cell_widths(&array![0., 1., 3.]);
        approx_eq(&w, &array![1., 1.5, 2.]);
        approx_eq(&cell_widths(&array![0.3]), &array![1.]);
    }

    #[test]
    fn test_cell_volumes_sum_to_domain() {
        let grid = Grid::uniform(8, 1, 4, [1., 1., 0.5]).unwrap();
        let vol = grid.cell_volumes(Stagger::for_field("w"));
        assert_eq!(vol.shape(), &[4, 1, 8]);
        assert_abs_diff_eq!(vol.sum(), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_resolution_spacing() {
        let res = Resolution::new(16, 8);
        assert_abs_diff_eq!(res.spacing(), 0.0625);
        assert_eq!(res.to_string(), "16x8");
    }
}
