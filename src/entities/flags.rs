//! Bit flags carried by measurement and test item records
//!
//! Values follow the STDF record layout the parser copies them from.

/// `OPT_FLAG` bits on a test item
pub mod opt_flag {
    /// Low limit is not used; the item can never fail low
    pub const NO_LOW_LIMIT: u8 = 0x40;
    /// High limit is not used; the item can never fail high
    pub const NO_HIGH_LIMIT: u8 = 0x80;
}

/// `PARM_FLG` bits on a test item
pub mod parm_flag {
    /// Low limit comparison is inclusive (`>=`) instead of strict (`>`)
    pub const EQUAL_LOW_LIMIT: u8 = 0x40;
    /// High limit comparison is inclusive (`<=`) instead of strict (`<`)
    pub const EQUAL_HIGH_LIMIT: u8 = 0x80;
}

/// `TEST_FLG` bits on a measurement
pub mod test_flag {
    /// The measurement failed its limits when it was produced
    pub const TEST_FAILED: u8 = 0x80;
}

/// Returns true when `bit` is set in `flags`
pub fn has(flags: u8, bit: u8) -> bool {
    flags & bit == bit
}
