use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumString};

use crate::flag::REG_NUM;

/// The register file. `r4` has no mnemonic name and is only reachable
/// through its index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum Reg {
    Ax = 0,
    Bx = 1,
    Cx = 2,
    Dx = 3,
    R4 = 4,
    Bp = 5,
    Sp = 6,
    Pc = 7,
}

impl Reg {
    /// Parses a register name (case-insensitive) or a bare index
    /// `0..=7`.
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Ok(reg) = s.to_ascii_lowercase().parse::<Reg>() {
            return Ok(reg);
        }
        match s.parse::<u8>().ok().filter(|num| *num <= REG_NUM) {
            Some(num) => Reg::try_from(num).map_err(|_| format!("Unknown register: `{s}`")),
            None => Err(format!("Unknown register: `{s}`")),
        }
    }

    pub fn index(self) -> u8 {
        self.into()
    }
}
