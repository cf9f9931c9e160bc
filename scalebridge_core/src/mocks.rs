//! Test and helper mocks for scalebridge_core

use scalebridge_traits::{LinkOpener, ScaleLink};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted `read` result.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Data(Vec<u8>),
    Timeout,
    Fail(String),
}

impl ReadStep {
    pub fn text(s: &str) -> Self {
        ReadStep::Data(s.as_bytes().to_vec())
    }
}

/// One scripted `open` result.
#[derive(Debug, Clone)]
pub enum OpenStep {
    Link(Vec<ReadStep>),
    Fail(String),
}

/// Link that replays a script, then times out forever.
pub struct ScriptedLink {
    steps: VecDeque<ReadStep>,
}

impl ScaleLink for ScriptedLink {
    fn read(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        match self.steps.pop_front() {
            Some(ReadStep::Data(b)) => Ok(Some(b)),
            Some(ReadStep::Timeout) | None => Ok(None),
            Some(ReadStep::Fail(msg)) => Err(Box::new(std::io::Error::other(msg))),
        }
    }
}

/// Opener that replays a script of open outcomes, then fails every open.
pub struct ScriptedOpener {
    steps: VecDeque<OpenStep>,
    opens: Arc<AtomicUsize>,
}

impl ScriptedOpener {
    pub fn new(steps: Vec<OpenStep>) -> Self {
        Self {
            steps: steps.into(),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A single link that yields `frames` in order.
    pub fn frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reads = frames.into_iter().map(|f| ReadStep::text(f.as_ref())).collect();
        Self::new(vec![OpenStep::Link(reads)])
    }

    /// Counter of `open` calls, shared with the opener.
    pub fn open_count(&self) -> Arc<AtomicUsize> {
        self.opens.clone()
    }
}

impl LinkOpener for ScriptedOpener {
    type Link = ScriptedLink;

    fn open(&mut self) -> Result<ScriptedLink, Box<dyn std::error::Error + Send + Sync>> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        match self.steps.pop_front() {
            Some(OpenStep::Link(reads)) => Ok(ScriptedLink {
                steps: reads.into(),
            }),
            Some(OpenStep::Fail(msg)) => Err(Box::new(std::io::Error::other(msg))),
            None => Err(Box::new(std::io::Error::other("script exhausted"))),
        }
    }

    fn endpoint(&self) -> String {
        String::from("scripted")
    }
}
