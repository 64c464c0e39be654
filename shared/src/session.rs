//! Screen-state sequencer for clients of the analysis service.
//!
//! The app shows exactly one screen at a time. Transitions are driven by
//! discrete events (user taps, model-load completion, analysis completion)
//! and are pure: the session never performs I/O itself. When a transition
//! requires work from the host, `apply` returns a [`Command`].

use crate::AnalysisResponse;

/// The mutually exclusive screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Idle,
    Camera,
    Preview,
    Processing,
    Results,
}

/// Discrete inputs that drive the sequencer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ModelsReady,
    OpenCamera,
    CloseCamera,
    Captured(Vec<u8>),
    Retake,
    PickedImage(Vec<u8>),
    Submit,
    AnalysisFinished(AnalysisResponse),
    AnalysisFailed,
}

/// Work the host must perform on behalf of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Analyze(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    screen: Screen,
    photo: Option<Vec<u8>>,
    result: Option<AnalysisResponse>,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Loading
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The most recent successful analysis, surviving later failures.
    pub fn result(&self) -> Option<&AnalysisResponse> {
        self.result.as_ref()
    }

    /// Applies one event. Events that are not valid for the current screen
    /// are ignored; in particular nothing can be submitted while a photo is
    /// already processing, and everything is gated until the models are
    /// ready.
    pub fn apply(&mut self, event: SessionEvent) -> Option<Command> {
        match (self.screen, event) {
            (Screen::Loading, SessionEvent::ModelsReady) => {
                self.screen = Screen::Idle;
                None
            }
            (Screen::Idle | Screen::Results, SessionEvent::OpenCamera) => {
                self.screen = Screen::Camera;
                None
            }
            (Screen::Idle | Screen::Results, SessionEvent::PickedImage(bytes)) => {
                self.photo = Some(bytes.clone());
                self.screen = Screen::Processing;
                Some(Command::Analyze(bytes))
            }
            (Screen::Camera, SessionEvent::Captured(bytes)) => {
                self.photo = Some(bytes);
                self.screen = Screen::Preview;
                None
            }
            (Screen::Camera, SessionEvent::CloseCamera) => {
                self.screen = self.home_screen();
                None
            }
            (Screen::Preview, SessionEvent::Retake) => {
                self.photo = None;
                self.screen = Screen::Camera;
                None
            }
            (Screen::Preview, SessionEvent::Submit) => match self.photo.clone() {
                Some(bytes) => {
                    self.screen = Screen::Processing;
                    Some(Command::Analyze(bytes))
                }
                None => None,
            },
            (Screen::Processing, SessionEvent::AnalysisFinished(response)) => {
                self.result = Some(response);
                self.screen = Screen::Results;
                None
            }
            (Screen::Processing, SessionEvent::AnalysisFailed) => {
                // The failed photo is discarded; an earlier result stays.
                self.photo = None;
                self.screen = self.home_screen();
                None
            }
            _ => None,
        }
    }

    fn home_screen(&self) -> Screen {
        if self.result.is_some() {
            Screen::Results
        } else {
            Screen::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(tag: &str) -> AnalysisResponse {
        AnalysisResponse {
            image_sha256: tag.to_string(),
            malignant_probability: 0.5,
            lesion_probabilities: Vec::new(),
            analyzed_at: String::new(),
        }
    }

    #[test]
    fn everything_gated_until_models_ready() {
        let mut session = Session::new();
        assert_eq!(session.apply(SessionEvent::OpenCamera), None);
        assert_eq!(session.apply(SessionEvent::PickedImage(vec![1])), None);
        assert_eq!(session.screen(), Screen::Loading);

        session.apply(SessionEvent::ModelsReady);
        assert_eq!(session.screen(), Screen::Idle);
    }

    #[test]
    fn capture_preview_submit_flow() {
        let mut session = Session::new();
        session.apply(SessionEvent::ModelsReady);
        session.apply(SessionEvent::OpenCamera);
        assert_eq!(session.screen(), Screen::Camera);

        session.apply(SessionEvent::Captured(vec![1, 2, 3]));
        assert_eq!(session.screen(), Screen::Preview);

        let command = session.apply(SessionEvent::Submit);
        assert_eq!(command, Some(Command::Analyze(vec![1, 2, 3])));
        assert_eq!(session.screen(), Screen::Processing);
    }

    #[test]
    fn no_submission_while_processing() {
        let mut session = Session::new();
        session.apply(SessionEvent::ModelsReady);
        session.apply(SessionEvent::PickedImage(vec![1]));
        assert_eq!(session.screen(), Screen::Processing);

        assert_eq!(session.apply(SessionEvent::PickedImage(vec![2])), None);
        assert_eq!(session.apply(SessionEvent::Submit), None);
        assert_eq!(session.screen(), Screen::Processing);
    }

    #[test]
    fn failure_discards_photo_and_keeps_prior_result() {
        let mut session = Session::new();
        session.apply(SessionEvent::ModelsReady);
        session.apply(SessionEvent::PickedImage(vec![1]));
        session.apply(SessionEvent::AnalysisFinished(response("first")));
        assert_eq!(session.screen(), Screen::Results);

        session.apply(SessionEvent::PickedImage(vec![2]));
        session.apply(SessionEvent::AnalysisFailed);
        assert_eq!(session.screen(), Screen::Results);
        assert_eq!(session.result().map(|r| r.image_sha256.as_str()), Some("first"));
    }

    #[test]
    fn failure_without_prior_result_returns_to_idle() {
        let mut session = Session::new();
        session.apply(SessionEvent::ModelsReady);
        session.apply(SessionEvent::PickedImage(vec![1]));
        session.apply(SessionEvent::AnalysisFailed);
        assert_eq!(session.screen(), Screen::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn retake_returns_to_camera() {
        let mut session = Session::new();
        session.apply(SessionEvent::ModelsReady);
        session.apply(SessionEvent::OpenCamera);
        session.apply(SessionEvent::Captured(vec![9]));
        session.apply(SessionEvent::Retake);
        assert_eq!(session.screen(), Screen::Camera);
        // A submit after retake has no photo to hand over.
        assert_eq!(session.apply(SessionEvent::Submit), None);
    }
}
