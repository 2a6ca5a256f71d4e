use rust_fsm::*;

state_machine! {
    media_flow(Created)

    Created(HydrateReady) => Ready,
    Created(HydratePublished) => Published,
    Created(HydrateError) => Errored,

    Created(StillProcessing) => Created,
    Created(Finished) => Ready,
    Created(Failed) => Errored,

    Ready(Publish) => Published,
    Ready(Failed) => Errored
}

/// Lifecycle of a Graph API media container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaState {
    Created,
    Ready,
    Published,
    Error,
}

impl MediaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MediaState::Published | MediaState::Error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    /// `status_code` was IN_PROGRESS (or anything not yet final).
    StillProcessing,
    /// `status_code` was FINISHED.
    Finished,
    /// `status_code` was ERROR, or a request failed.
    Failed,
    Publish,
}

impl MediaEvent {
    pub fn from_status_code(status_code: &str) -> Self {
        match status_code {
            "FINISHED" => MediaEvent::Finished,
            "ERROR" | "EXPIRED" => MediaEvent::Failed,
            _ => MediaEvent::StillProcessing,
        }
    }
}

fn hydrate(machine: &mut media_flow::StateMachine, state: MediaState) -> Result<(), ()> {
    let input = match state {
        MediaState::Created => return Ok(()),
        MediaState::Ready => media_flow::Input::HydrateReady,
        MediaState::Published => media_flow::Input::HydratePublished,
        MediaState::Error => media_flow::Input::HydrateError,
    };
    machine.consume(&input).map_err(|_| ())?;
    Ok(())
}

fn expected_next_state(current: MediaState, event: MediaEvent) -> Option<MediaState> {
    match (current, event) {
        (MediaState::Created, MediaEvent::StillProcessing) => Some(MediaState::Created),
        (MediaState::Created, MediaEvent::Finished) => Some(MediaState::Ready),
        (MediaState::Created, MediaEvent::Failed) => Some(MediaState::Error),
        (MediaState::Ready, MediaEvent::Publish) => Some(MediaState::Published),
        (MediaState::Ready, MediaEvent::Failed) => Some(MediaState::Error),
        _ => None,
    }
}

pub fn transition(current: MediaState, event: MediaEvent) -> Option<MediaState> {
    let mut machine = media_flow::StateMachine::new();
    hydrate(&mut machine, current).ok()?;

    let input = match event {
        MediaEvent::StillProcessing => media_flow::Input::StillProcessing,
        MediaEvent::Finished => media_flow::Input::Finished,
        MediaEvent::Failed => media_flow::Input::Failed,
        MediaEvent::Publish => media_flow::Input::Publish,
    };

    machine.consume(&input).ok()?;
    expected_next_state(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_happy_path() {
        let polled = transition(MediaState::Created, MediaEvent::StillProcessing);
        assert_eq!(polled, Some(MediaState::Created));
        let ready = transition(MediaState::Created, MediaEvent::Finished);
        assert_eq!(ready, Some(MediaState::Ready));
        assert_eq!(
            transition(MediaState::Ready, MediaEvent::Publish),
            Some(MediaState::Published)
        );
    }

    #[test]
    fn cannot_publish_before_ready_or_after_terminal() {
        assert_eq!(transition(MediaState::Created, MediaEvent::Publish), None);
        assert_eq!(transition(MediaState::Published, MediaEvent::Publish), None);
        assert_eq!(transition(MediaState::Error, MediaEvent::Finished), None);
        assert!(MediaState::Error.is_terminal());
    }

    #[test]
    fn status_codes_map_to_events() {
        assert_eq!(MediaEvent::from_status_code("FINISHED"), MediaEvent::Finished);
        assert_eq!(MediaEvent::from_status_code("ERROR"), MediaEvent::Failed);
        assert_eq!(
            MediaEvent::from_status_code("IN_PROGRESS"),
            MediaEvent::StillProcessing
        );
    }
}
