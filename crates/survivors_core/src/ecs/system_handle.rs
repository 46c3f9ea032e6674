use std::fmt;

/// Handle assigned to each registered system.
///
/// The index is the system's position in declaration order. Schedules merge
/// per-system command buffers by ascending handle, so the order of the
/// deferred queue does not depend on which worker finished first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SystemHandle(u32);

impl SystemHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}
