use super::messages::{ImageMessage, PolygonMessage, StatusMessage};

/// Publish side of one transport topic.
///
/// Publishing is fire-and-forget: the transport owns delivery, and a full
/// or disconnected topic is the subscriber's problem, not the publisher's.
pub trait Publisher<T>: Send {
    fn publish(&self, msg: T);
}

/// The node's output topics, one publisher each.
pub struct NodeOutputs {
    pub eye_region: Box<dyn Publisher<PolygonMessage>>,
    pub mouth_region: Box<dyn Publisher<PolygonMessage>>,
    pub rescaled_image: Box<dyn Publisher<ImageMessage>>,
    pub debug_image: Box<dyn Publisher<ImageMessage>>,
    pub status: Box<dyn Publisher<StatusMessage>>,
}
