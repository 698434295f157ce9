use crate::FaceIdError;

/// Result of running face detection, alignment and embedding on one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The detector found no face.
    NoFace,
    /// A face was detected but could not be aligned.
    NotAligned,
    /// The aligned face's embedding.
    Embedded(Vec<f32>),
}

/// Extracts face embeddings from encoded images.
///
/// Detection, alignment and the embedding network live outside this crate;
/// implementations adapt them to this interface. The output vector length
/// is [`FaceEmbedder::dimension`] (512 for the deployed model).
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait FaceEmbedder: Send + Sync {
    /// Runs the detection, alignment and embedding stages on one image.
    fn embed(&self, image: &[u8]) -> Result<Extraction, FaceIdError>;

    /// Returns the dimensionality of the embedding vectors.
    fn dimension(&self) -> usize;
}
