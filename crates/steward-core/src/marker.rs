//! Management marker attached to declared members

/// Description used when a declaration doesn't supply one
pub const DEFAULT_DESCRIPTION: &str = "Dynamic Management MBean";

/// Opt-in marker for a field, method, or constructor.
///
/// `readable` and `writable` only matter when the member ends up backing an
/// attribute; operations and constructors ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedMarker {
    /// Human-readable description
    pub description: String,
    /// Whether the attribute may be read (default: true)
    pub readable: bool,
    /// Whether the attribute may be written (default: false)
    pub writable: bool,
}

impl ManagedMarker {
    /// Marker with default description and flags
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker with the given description and default flags
    pub fn described(description: impl Into<String>) -> Self {
        Self::new().description(description)
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the readable flag
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Set the writable flag
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}

impl Default for ManagedMarker {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            readable: true,
            writable: false,
        }
    }
}
