use serde::{Deserialize, Serialize};

/// One frame of a tab's content surface as reported by frame introspection.
///
/// The top frame always has `frame_id == 0` and `parent_frame_id == -1`;
/// subframe ids are a 32-bit signed hash of the frame URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    pub error_occurred: bool,
    pub process_id: i32,
    pub frame_id: i32,
    pub parent_frame_id: i32,
    pub url: String,
}
