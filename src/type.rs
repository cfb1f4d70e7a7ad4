use std::fmt::Debug;

use num_traits::{Float, FromPrimitive, ToPrimitive};

/// A trait for types that can be used as coordinates of indexed patterns.
///
/// This trait is sealed and cannot be implemented for external types. Distances are Euclidean, so
/// only floating point coordinates are supported.
pub trait Coordinate:
    private::Sealed + Float + FromPrimitive + ToPrimitive + Debug + Default + Send + Sync + 'static
{
    /// Name of the type, used in log output
    const TYPE_NAME: &'static str;

    /// Widen to `f64` for weight arithmetic.
    fn as_f64(self) -> f64;
}

impl Coordinate for f32 {
    const TYPE_NAME: &'static str = "f32";

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Coordinate for f64 {
    const TYPE_NAME: &'static str = "f64";

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Squared Euclidean distance between two points of equal length.
#[inline]
pub(crate) fn sq_dist<N: Coordinate>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| {
        let d = x - y;
        acc + d * d
    })
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
