/// Version tracker - used to mark scene changes that need a repaint
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { version: 0 }
    }

    /// Marks as modified, increments version by 1
    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Gets the current version number
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` if anything changed since `seen` was read.
    #[must_use]
    pub fn changed_since(&self, seen: u64) -> bool {
        self.version != seen
    }
}
