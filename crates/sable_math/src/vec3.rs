use crate::Vec3;

/// Components below this magnitude count as zero in [`Vec3Ext::near_zero`].
pub const NEAR_ZERO_EPSILON: f64 = 1e-8;

/// Vector helpers that glam does not provide.
pub trait Vec3Ext {
    /// True if every component's magnitude is below [`NEAR_ZERO_EPSILON`].
    fn near_zero(&self) -> bool;
}

impl Vec3Ext for Vec3 {
    #[inline]
    fn near_zero(&self) -> bool {
        self.abs().max_element() < NEAR_ZERO_EPSILON
    }
}
