//! Trait for person detection backends.

use crate::person::Person;

/// Source of untracked persons for a frame.
///
/// Implementations return persons with boxes, detection confidence and
/// optional keypoints populated, no cid, and "Unknown" identities.
///
/// # Example
///
/// ```ignore
/// use ppbox::{DetectionSource, Person, PersonBuilder};
///
/// struct MyYolo {
///     // Your model here
/// }
///
/// impl DetectionSource for MyYolo {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Person>, Self::Error> {
///         Ok(vec![PersonBuilder::new().xyxy(10.0, 20.0, 50.0, 120.0).det_conf(0.8).build()])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    /// Run detection on raw image data.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(&mut self, input: &[u8], width: u32, height: u32)
    -> Result<Vec<Person>, Self::Error>;
}
