//! Hand-written collaborators for driving the stages in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{CaptureDevice, CaptureError, FrontEnd, FrontEndError};
use crate::classify::{Classifier, ClassifierError, Signal};
use crate::notify::EventSink;

// ---------------------------------------------------------------------------
// ScriptedDevice
// ---------------------------------------------------------------------------

/// Fills each frame with the next scripted value; `None` fails the read.
/// Once the script runs out every read reports a disconnect.
pub struct ScriptedDevice {
    pub channels: usize,
    pub script: VecDeque<Option<i16>>,
}

impl ScriptedDevice {
    pub fn new(channels: usize, script: impl IntoIterator<Item = Option<i16>>) -> Self {
        Self {
            channels,
            script: script.into_iter().collect(),
        }
    }
}

impl CaptureDevice for ScriptedDevice {
    fn channels(&self) -> usize {
        self.channels
    }

    fn read(&mut self, frame: &mut [i16]) -> Result<(), CaptureError> {
        match self.script.pop_front() {
            Some(Some(value)) => {
                frame.fill(value);
                Ok(())
            }
            Some(None) => Err(CaptureError::Timeout(Duration::ZERO)),
            None => Err(CaptureError::Disconnected),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedFrontEnd
// ---------------------------------------------------------------------------

/// Serves scripted fetch results and records fed frames.  An exhausted
/// script fetches as a timeout.
pub struct ScriptedFrontEnd {
    pub chunk: usize,
    pub channels: usize,
    pub fetches: Mutex<VecDeque<Result<Vec<f32>, FrontEndError>>>,
    pub feed_results: Mutex<VecDeque<Result<(), FrontEndError>>>,
    pub fed: Mutex<Vec<Vec<i16>>>,
}

impl ScriptedFrontEnd {
    pub fn new(chunk: usize, channels: usize) -> Self {
        Self {
            chunk,
            channels,
            fetches: Mutex::new(VecDeque::new()),
            feed_results: Mutex::new(VecDeque::new()),
            fed: Mutex::new(Vec::new()),
        }
    }

    pub fn push_frame(&self, frame: Vec<f32>) {
        self.fetches.lock().unwrap().push_back(Ok(frame));
    }

    pub fn push_fetch_error(&self, err: FrontEndError) {
        self.fetches.lock().unwrap().push_back(Err(err));
    }

    pub fn push_feed_result(&self, result: Result<(), FrontEndError>) {
        self.feed_results.lock().unwrap().push_back(result);
    }
}

impl FrontEnd for ScriptedFrontEnd {
    fn feed_chunk_size(&self) -> usize {
        self.chunk
    }

    fn fetch_chunk_size(&self) -> usize {
        self.chunk
    }

    fn feed_channels(&self) -> usize {
        self.channels
    }

    fn feed(&self, frame: &[i16]) -> Result<(), FrontEndError> {
        self.fed.lock().unwrap().push(frame.to_vec());
        self.feed_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn fetch(&self) -> Result<Vec<f32>, FrontEndError> {
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FrontEndError::Timeout(Duration::ZERO)))
    }
}

// ---------------------------------------------------------------------------
// ScriptedClassifier
// ---------------------------------------------------------------------------

/// Returns scripted outcomes in order and records the window it was shown.
/// An exhausted script fails the run.
#[derive(Default)]
pub struct ScriptedClassifier {
    pub outcomes: VecDeque<Result<Vec<f32>, ClassifierError>>,
    pub seen: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl ScriptedClassifier {
    pub fn new(outcomes: impl IntoIterator<Item = Result<Vec<f32>, ClassifierError>>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            seen: Arc::default(),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn label_count(&self) -> usize {
        2
    }

    fn run(&mut self, signal: &dyn Signal) -> Result<Vec<f32>, ClassifierError> {
        let mut window = vec![0.0; signal.total_length()];
        signal.get_data(0, &mut window)?;
        self.seen.lock().unwrap().push(window);
        self.outcomes
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::Inference("script exhausted".into())))
    }
}

pub fn primary() -> Result<Vec<f32>, ClassifierError> {
    Ok(vec![0.9, 0.1])
}

pub fn background() -> Result<Vec<f32>, ClassifierError> {
    Ok(vec![0.1, 0.9])
}

pub fn failure() -> Result<Vec<f32>, ClassifierError> {
    Err(ClassifierError::Inference("model error".into()))
}

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

/// A closure sink plus the shared list it appends to.
pub fn recording_sink() -> (impl EventSink, Arc<Mutex<Vec<bool>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let events = Arc::clone(&events);
        move |active: bool| events.lock().unwrap().push(active)
    };
    (sink, events)
}
