//! `Hdf5` functions to read and write ndarrays
use super::H5Type;
use super::Result;
use ndarray::{Array, Array1, ArrayBase, ArrayD, Dimension};
use std::path::Path;

/// Read scalar from hdf5
///
/// # Errors
/// When file or variable does not exists, or when
/// the variable is not a one element array.
pub fn read_scalar_from_hdf5<T, P>(filename: P, name: &str) -> Result<T>
where
    T: H5Type + Clone + Copy,
    P: AsRef<Path>,
{
    let file = hdf5::File::open(filename)?;
    let dset = file.dataset(name)?;
    let scalar: Array1<T> = dset.read_1d()?;
    scalar.first().copied().ok_or_else(|| {
        hdf5::Error::Internal(format!("Scalar {} is stored as an empty array", name))
    })
}

/// Interface to write scalar to hdf5 file
///
/// # Errors
/// When file can't be created or opened.
pub fn write_scalar_to_hdf5<T, P>(filename: P, name: &str, scalar: T) -> Result<()>
where
    T: H5Type + Copy,
    P: AsRef<Path>,
{
    let x = Array1::<T>::from_elem(1, scalar);
    write_to_hdf5(filename, name, &x)?;
    Ok(())
}

/// Read ndarray from hdf5 file
///
/// # Errors
/// Errors when file/variable does not exist and
/// when the stored array has another dimensionality
/// than requested.
pub fn read_from_hdf5<A, D, P>(filename: P, varname: &str) -> Result<Array<A, D>>
where
    A: H5Type,
    D: Dimension,
    P: AsRef<Path>,
{
    // Open file
    let file = hdf5::File::open(filename)?;

    //Read dataset
    let data = file.dataset(varname)?;
    let y: ArrayD<A> = data.read_dyn::<A>()?;

    // Dyn to static
    y.into_dimensionality::<D>().map_err(|e| {
        hdf5::Error::Internal(format!(
            "Dataset {} has unexpected dimensionality: {}",
            varname, e
        ))
    })
}

/// Write ndarray to hdf5 file
///
/// # Errors
/// When file can't be opened, or when file and
/// variable exists, but variable has different
/// shape than input array (assign new value will fail).
pub fn write_to_hdf5<A, S, D, P>(filename: P, varname: &str, array: &ArrayBase<S, D>) -> Result<()>
where
    A: H5Type,
    S: ndarray::Data<Elem = A>,
    D: Dimension,
    P: AsRef<Path>,
{
    // Open file
    let file = if filename.as_ref().exists() {
        hdf5::File::append(filename)?
    } else {
        hdf5::File::create(filename)?
    };

    //Write dataset
    let dset = match file.dataset(varname) {
        Ok(dset) => {
            // Overwrite
            dset
        }
        Err(..) => {
            // Create new dataset
            file.new_dataset::<A>()
                .no_chunk()
                .shape(array.shape())
                .create(varname)?
        }
    };
    dset.write(&array.view())?;
    Ok(())
}
