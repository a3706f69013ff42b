//! Frame identification for navigation introspection.
//!
//! Frame ids must be stable across calls without the content surface
//! keeping any registry, so they are derived from the frame URL with the
//! JavaScript string-hash idiom: `hash = (hash << 5) - hash + code`,
//! truncated to 32-bit signed at every step. Id 0 is reserved for the top
//! frame, whose parent is the -1 sentinel; subframes all report the top
//! frame as their parent.

use crate::types::FrameInfo;

/// 32-bit signed hash over the string's UTF-16 code units.
pub fn js_hash_code(s: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash
}

pub fn top_frame(process_id: i32, url: &str) -> FrameInfo {
    FrameInfo {
        error_occurred: false,
        process_id,
        frame_id: 0,
        parent_frame_id: -1,
        url: url.to_string(),
    }
}

pub fn child_frame(process_id: i32, url: &str) -> FrameInfo {
    FrameInfo {
        error_occurred: false,
        process_id,
        frame_id: js_hash_code(url),
        parent_frame_id: 0,
        url: url.to_string(),
    }
}

/// All frames of a surface, top frame first.
pub fn all_frames(process_id: i32, top_url: &str, child_urls: &[String]) -> Vec<FrameInfo> {
    let mut frames: Vec<FrameInfo> = child_urls
        .iter()
        .map(|url| child_frame(process_id, url))
        .collect();
    frames.insert(0, top_frame(process_id, top_url));
    frames
}

/// Locates the frame with the given id: subframes are matched by URL hash,
/// then id 0 falls back to the top frame.
pub fn find_frame(
    process_id: i32,
    frame_id: i32,
    top_url: &str,
    child_urls: &[String],
) -> Option<FrameInfo> {
    for url in child_urls {
        if js_hash_code(url) == frame_id {
            return Some(child_frame(process_id, url));
        }
    }
    if frame_id == 0 {
        return Some(top_frame(process_id, top_url));
    }
    None
}
