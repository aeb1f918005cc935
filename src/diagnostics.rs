//! Post-processing diagnostics on staggered fields
use crate::error::{Result, VerifyError};
use crate::field::GridField;
use crate::grid::{Axis, Grid, Stagger};
use crate::norm::norm_max;
use crate::run::SimulationRun;
use ndarray::{Array3, Zip};

/// Discrete divergence
/// $$
/// \frac{u\\_{e} - u\\_w}{\Delta x} + \frac{w\\_{t} - w\\_b}{\Delta z}
/// $$
/// at cell centers, with `u` on x-faces and `w` on z-faces.
///
/// Faces may precede their center (`xh[i] < x[i]`) or follow it
/// (`x[i] < xh[i]`), see [`Grid::faces_follow`].
/// If `xh` has as many entries as `x`, the x direction is periodic.
/// If `zh` has as many entries as `z`, the cell without a face below
/// (faces following) or above (faces preceding) is left out, the result
/// then has `nz - 1` levels.
///
/// # Errors
/// `ShapeMismatch` if `u` or `w` do not fit the grid
pub fn divergence(u: &GridField, w: &GridField, grid: &Grid) -> Result<Array3<f64>> {
    check_shape(u, Stagger::for_field("u"), grid)?;
    check_shape(w, Stagger::for_field("w"), grid)?;
    let (nx, ny, nz) = (grid.x.len(), grid.y.len(), grid.z.len());
    let periodic_x = grid.xh.len() == nx;
    let x_follow = grid.faces_follow(Axis::X);
    let z_follow = grid.faces_follow(Axis::Z);
    // first center level and number of levels with both faces
    let (k0, nk) = match (grid.zh.len() == nz, z_follow) {
        (false, _) => (0, nz),
        (true, false) => (0, nz - 1),
        (true, true) => (1, nz - 1),
    };

    let mut div = Array3::<f64>::zeros((nk, ny, nx));
    Zip::indexed(&mut div).par_for_each(|(kk, j, i), d| {
        let k = kk + k0;
        let (iw, ie, dx) = if x_follow {
            let iw = if i == 0 { nx - 1 } else { i - 1 };
            (iw, i, 2. * (grid.xh[i] - grid.x[i]))
        } else if periodic_x {
            (i, (i + 1) % nx, 2. * (grid.x[i] - grid.xh[i]))
        } else {
            (i, i + 1, grid.xh[i + 1] - grid.xh[i])
        };
        let (kb, kt) = if z_follow { (k - 1, k) } else { (k, k + 1) };
        let dz = grid.zh[kt] - grid.zh[kb];
        *d = (u.v[[k, j, ie]] - u.v[[k, j, iw]]) / dx + (w.v[[kt, j, i]] - w.v[[kb, j, i]]) / dz;
    });
    Ok(div)
}

/// Maximum absolute divergence of the velocity of a run,
/// `None` if `u` or `w` is missing.
///
/// # Errors
/// `ShapeMismatch` if `u` or `w` do not fit the grid
pub fn max_divergence(run: &SimulationRun) -> Result<Option<f64>> {
    match (run.field("u"), run.field("w")) {
        (Some(u), Some(w)) => Ok(Some(norm_max(&divergence(u, w, &run.grid)?))),
        _ => Ok(None),
    }
}

fn check_shape(field: &GridField, stagger: Stagger, grid: &Grid) -> Result<()> {
    let expected = grid.shape_of(stagger);
    if field.shape() != expected {
        return Err(VerifyError::ShapeMismatch {
            field: field.name.clone(),
            expected: expected.to_vec(),
            found: field.shape().to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TaylorGreen;

    fn max_div(nx: usize, nz: usize, zsize: f64, time: f64) -> f64 {
        let grid = Grid::uniform(nx, 1, nz, [1., 1., zsize]).unwrap();
        let reference = TaylorGreen::new(0.1).unwrap().evaluate_on(&grid, time).unwrap();
        let div = divergence(
            reference.field("u").unwrap(),
            reference.field("w").unwrap(),
            &grid,
        )
        .unwrap();
        assert_eq!(div.shape(), &[nz - 1, 1, nx]);
        norm_max(&div)
    }

    #[test]
    fn test_analytic_velocity_is_divergence_free() {
        for n in [16, 32, 64, 128] {
            for time in [0., 0.1, 1.] {
                assert!(max_div(n, n / 2, 0.5, time) < 1e-10);
            }
        }
    }

    #[test]
    fn test_divergence_second_order_on_anisotropic_grid() {
        // dz = 2 dx
        let coarse = max_div(32, 8, 0.5, 0.);
        let fine = max_div(64, 16, 0.5, 0.);
        assert!(coarse > 1e-6);
        let ratio = coarse / fine;
        assert!(ratio > 3.5 && ratio < 4.5, "ratio {}", ratio);
    }

    #[test]
    fn test_faces_with_extra_entry() {
        let x = ndarray::Array1::from_shape_fn(8, |i| (i as f64 + 0.5) / 8.);
        let xh = ndarray::Array1::from_shape_fn(9, |i| i as f64 / 8.);
        let z = ndarray::Array1::from_shape_fn(4, |k| (k as f64 + 0.5) / 8.);
        let zh = ndarray::Array1::from_shape_fn(5, |k| k as f64 / 8.);
        let grid = Grid::new_2d(x, xh, z, zh).unwrap();
        let reference = TaylorGreen::new(0.1).unwrap().evaluate_on(&grid, 0.).unwrap();
        let div = divergence(
            reference.field("u").unwrap(),
            reference.field("w").unwrap(),
            &grid,
        )
        .unwrap();
        assert_eq!(div.shape(), &[4, 1, 8]);
        assert!(norm_max(&div) < 1e-10);
    }

    #[test]
    fn test_faces_following_centers() {
        let (nx, nz) = (32, 16);
        let x = ndarray::Array1::from_shape_fn(nx, |i| (i as f64 + 0.5) / nx as f64);
        let xh = ndarray::Array1::from_shape_fn(nx, |i| (i as f64 + 1.) / nx as f64);
        let z = ndarray::Array1::from_shape_fn(nz, |k| (k as f64 + 0.5) / nx as f64);
        let zh = ndarray::Array1::from_shape_fn(nz, |k| (k as f64 + 1.) / nx as f64);
        let grid = Grid::new_2d(x, xh, z, zh).unwrap();
        assert!(grid.faces_follow(Axis::X) && grid.faces_follow(Axis::Z));
        let reference = TaylorGreen::new(0.1).unwrap().evaluate_on(&grid, 0.).unwrap();
        let div = divergence(
            reference.field("u").unwrap(),
            reference.field("w").unwrap(),
            &grid,
        )
        .unwrap();
        assert_eq!(div.shape(), &[nz - 1, 1, nx]);
        assert!(norm_max(&div) < 1e-10);
    }

    #[test]
    fn test_max_divergence_without_velocity() {
        let grid = Grid::uniform(8, 1, 4, [1., 1., 0.5]).unwrap();
        let run = SimulationRun::new("p-only", crate::grid::Resolution::new(8, 4), 0, grid);
        assert_eq!(max_divergence(&run).unwrap(), None);
    }
}
