//! Domain-separation labels.
//!
//! Each label is used as the HPKE `info` for exactly one kind of half, so a
//! ciphertext produced for one purpose never opens under another. The
//! strings are part of the wire protocol and must not change.

/// User bearer, first half (scalar ‖ chain code) to the recovery code.
pub const USER_FIRST_HALF_TO_RECOVERY_CODE: &str = "muun.com/key-escrow/v3/1/1/recovery-code";

/// User bearer, second half (scalar) to the recovery code.
pub const USER_SECOND_HALF_TO_RECOVERY_CODE: &str = "muun.com/key-escrow/v3/1/2/recovery-code";

/// Muun bearer, first half (scalar ‖ chain code) to the recovery code.
pub const MUUN_FIRST_HALF_TO_RECOVERY_CODE: &str = "muun.com/key-escrow/v3/2/1/recovery-code";

/// Muun bearer, second half (scalar) to the recovery code.
pub const MUUN_SECOND_HALF_TO_RECOVERY_CODE: &str = "muun.com/key-escrow/v3/2/2/recovery-code";

/// Muun bearer, first half (scalar) to the user's device.
pub const MUUN_FIRST_HALF_TO_CLIENT: &str = "muun.com/key-escrow/v3/2/1/client";
