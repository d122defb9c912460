/// Frame id that asks the radio not to send a status response.
pub const NO_RESPONSE_FRAME_ID: u8 = 0;

/// Hands out frame ids 1..=255, wrapping back to 1.
///
/// Zero is never produced because it disables the status response that the
/// id exists to correlate.
#[derive(Debug, Clone, Default)]
pub struct FrameIdAllocator {
    last: u8,
}

impl FrameIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u8 {
        self.last = match self.last.wrapping_add(1) {
            NO_RESPONSE_FRAME_ID => 1,
            id => id,
        };
        self.last
    }

    /// The id most recently handed out, if any.
    pub fn last(&self) -> Option<u8> {
        (self.last != NO_RESPONSE_FRAME_ID).then_some(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let mut ids = FrameIdAllocator::new();
        assert_eq!(ids.last(), None);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.last(), Some(2));
    }

    #[test]
    fn wraps_past_255_without_zero() {
        let mut ids = FrameIdAllocator::new();
        let first: Vec<u8> = (0..255).map(|_| ids.next_id()).collect();
        assert_eq!(first, (1..=255).collect::<Vec<u8>>());
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
    }

    #[test]
    fn never_emits_zero() {
        let mut ids = FrameIdAllocator::new();
        assert!((0..2000).all(|_| ids.next_id() != NO_RESPONSE_FRAME_ID));
    }

    #[test]
    fn allocators_are_independent() {
        let mut a = FrameIdAllocator::new();
        let mut b = FrameIdAllocator::new();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id(), 1);
    }
}
