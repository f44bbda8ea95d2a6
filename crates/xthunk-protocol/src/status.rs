use std::fmt;

/// Status of a boundary crossing, distinct from the API-level result carried
/// in the parameter block. Anything but `SUCCESS` is a link or build defect.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NtStatus(pub u32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0);
    pub const UNSUCCESSFUL: Self = Self(0xC000_0001);
    pub const NOT_IMPLEMENTED: Self = Self(0xC000_0002);
    pub const INVALID_PARAMETER: Self = Self(0xC000_000D);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::SUCCESS => "STATUS_SUCCESS",
            Self::UNSUCCESSFUL => "STATUS_UNSUCCESSFUL",
            Self::NOT_IMPLEMENTED => "STATUS_NOT_IMPLEMENTED",
            Self::INVALID_PARAMETER => "STATUS_INVALID_PARAMETER",
            _ => return write!(f, "NtStatus({:#010x})", self.0),
        };
        f.write_str(name)
    }
}
