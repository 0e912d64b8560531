//! Decoder configuration and target architecture masks.

bitflags::bitflags! {
    /// Instruction-set architectures a structure type may legally appear on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArchCompat: u32 {
        /// 32-bit x86.
        const IA32 = 1 << 0;
        /// x86-64.
        const X64 = 1 << 1;
        /// 32-bit Arm.
        const ARM = 1 << 2;
        /// 64-bit Arm.
        const AARCH64 = 1 << 3;
    }
}

impl ArchCompat {
    /// Both x86 flavours.
    pub const X86: Self = Self::IA32.union(Self::X64);
    /// Both Arm flavours.
    pub const ARM_ANY: Self = Self::ARM.union(Self::AARCH64);

    /// The mask of architectures accepted on the build target.
    ///
    /// Arm builds only accept Arm structures. Every other build accepts every
    /// structure type, so x86 hosts can inspect tables captured on any
    /// platform without tripping the count validator.
    #[must_use]
    pub const fn target() -> Self {
        if cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            Self::ARM_ANY
        } else {
            Self::all()
        }
    }

    /// Looks up an architecture by its short name (`ia32`, `x64`, `arm`,
    /// `aarch64`).
    #[must_use]
    pub fn from_arch_name(name: &str) -> Option<Self> {
        match name {
            "ia32" => Some(Self::IA32),
            "x64" => Some(Self::X64),
            "arm" => Some(Self::ARM),
            "aarch64" => Some(Self::AARCH64),
            _ => None,
        }
    }

    /// Returns `true` when Arm-specific validation rules apply.
    #[must_use]
    pub const fn is_arm(self) -> bool {
        self.intersects(Self::ARM_ANY) && !self.intersects(Self::X86)
    }
}

/// Decoder behaviour switches, fixed for the lifetime of a [`Session`].
///
/// [`Session`]: crate::Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Enables offset-drift detection, field validators and the count
    /// validator pass.
    pub consistency_checking: bool,
    /// Asks the sink to style errors, warnings and section headers.
    pub highlight: bool,
    /// Architectures whose structures may legally appear in the tables.
    pub target: ArchCompat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consistency_checking: true,
            highlight: false,
            target: ArchCompat::target(),
        }
    }
}
