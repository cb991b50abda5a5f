/// Processing flags passed opaquely to an engine on every drain.
///
/// Bit layout:
///   bit 0 = FINISH, no further input will arrive; drain everything
///   bits 1-31 = reserved, carried but ignored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Self = Self(0);
    pub const FINISH: Self = Self(0b0000_0001);

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_finish(self) -> bool {
        self.0 & Self::FINISH.0 != 0
    }
}

impl std::ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
