use bevy::prelude::*;

/// Identifier of one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Render loop handle. While the viewer runs exactly one frame request is
/// outstanding; the per-frame systems only run when one is, and the request
/// is re-armed at the end of every frame. Cancelling it stops the cycle.
#[derive(Resource, Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameRequest>,
    next_id: u64,
    frames_rendered: u64,
}

impl FrameLoop {
    /// Schedule the next frame, replacing any request still outstanding.
    pub fn request(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_id);
        self.next_id += 1;
        self.pending = Some(request);
        request
    }

    pub fn cancel(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

/// Run condition for the per-frame cycle.
pub fn frame_scheduled(frame_loop: Res<FrameLoop>) -> bool {
    frame_loop.is_scheduled()
}

/// Consume this frame's request and arm the next one.
pub fn end_frame(mut frame_loop: ResMut<FrameLoop>) {
    if frame_loop.pending.take().is_some() {
        frame_loop.frames_rendered += 1;
        frame_loop.request();
    }
}
