// Trash categories and their wire encoding
//
// The classifier host speaks bare ASCII integers over the serial link: one
// integer per command, no framing, no checksum. Values outside the recognized
// set are coerced to the idle category rather than surfaced.

/// What the host decided about the item that arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashCategory {
    /// Idle / reset value.
    None,
    Metal,
    Plastic,
    Paper,
    /// Classification failed or several types fell together; disposed via a
    /// fixed composite routine. Not currently assigned a wire code.
    Unsorted,
    /// The host has signaled arrival but not yet classified; must be
    /// superseded by a real category before disposal begins.
    Incoming,
}

impl TrashCategory {
    /// Decode one host integer. Anything outside the recognized set maps to
    /// `None`.
    pub fn from_wire(value: i32) -> Self {
        match value {
            1 => Self::Metal,
            2 => Self::Plastic,
            3 => Self::Paper,
            9 => Self::Incoming,
            _ => Self::None,
        }
    }

    /// True for categories that trigger a disposal sequence.
    pub fn is_actionable(self) -> bool {
        matches!(self, Self::Metal | Self::Plastic | Self::Paper | Self::Unsorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_wire_values() {
        assert_eq!(TrashCategory::from_wire(0), TrashCategory::None);
        assert_eq!(TrashCategory::from_wire(1), TrashCategory::Metal);
        assert_eq!(TrashCategory::from_wire(2), TrashCategory::Plastic);
        assert_eq!(TrashCategory::from_wire(3), TrashCategory::Paper);
        assert_eq!(TrashCategory::from_wire(9), TrashCategory::Incoming);
    }

    #[test]
    fn test_unrecognized_wire_values_coerce_to_none() {
        assert_eq!(TrashCategory::from_wire(-1), TrashCategory::None);
        assert_eq!(TrashCategory::from_wire(4), TrashCategory::None);
        assert_eq!(TrashCategory::from_wire(100), TrashCategory::None);
    }

    #[test]
    fn test_actionable_categories() {
        assert!(TrashCategory::Metal.is_actionable());
        assert!(TrashCategory::Plastic.is_actionable());
        assert!(TrashCategory::Paper.is_actionable());
        assert!(TrashCategory::Unsorted.is_actionable());
        assert!(!TrashCategory::None.is_actionable());
        assert!(!TrashCategory::Incoming.is_actionable());
    }
}
