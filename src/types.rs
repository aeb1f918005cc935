//! Types and traits for real numbers
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Floating point type, used throughout this crate for
/// the generic reductions (norms, log-log slopes)
pub trait FloatNum: Float + FromPrimitive + Sum + Debug + Display + Send + Sync + 'static {}

impl<T> FloatNum for T where T: Float + FromPrimitive + Sum + Debug + Display + Send + Sync + 'static {}
