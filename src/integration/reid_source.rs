use std::convert::Infallible;

use crate::person::Person;
use crate::reid::ReIdSignal;

/// Face or deep-embedding classifier run on one tracked person.
pub trait ReIdSource {
    type Error;

    /// Identify `person` in the frame. `Ok(None)` means no result this frame.
    fn infer(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        person: &Person,
    ) -> Result<Option<ReIdSignal>, Self::Error>;
}

/// Re-id source that never recognises anyone; tracking-only sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReId;

impl ReIdSource for NoReId {
    type Error = Infallible;

    fn infer(
        &mut self,
        _input: &[u8],
        _width: u32,
        _height: u32,
        _person: &Person,
    ) -> Result<Option<ReIdSignal>, Self::Error> {
        Ok(None)
    }
}
