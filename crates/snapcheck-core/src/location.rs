//! Paths into nested values, used for diff entries and warnings

use std::fmt;

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Position in a sequence
    Index(usize),
    /// String key of a mapping
    Key(String),
    /// Non-string mapping key, rendered in canonical form
    EncodedKey(String),
    /// Attribute of a class instance
    Attribute(String),
    /// Magnitude of a unit quantity
    Magnitude,
    /// Body of a custom-encoded class
    Encoded,
    /// Anything else, rendered verbatim
    Field(&'static str),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(index) => write!(f, "[{}]", index),
            Segment::Key(key) => write!(f, "[{:?}]", key),
            Segment::EncodedKey(key) => write!(f, "[{}]", key),
            Segment::Attribute(name) => write!(f, ".{}", name),
            Segment::Magnitude => write!(f, ".<magnitude>"),
            Segment::Encoded => write!(f, ".<encoded>"),
            Segment::Field(name) => write!(f, ".{}", name),
        }
    }
}

/// Path from the root of a value, displayed as `$[0]["key"].attr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    segments: Vec<Segment>,
}

impl Location {
    /// The root location
    pub fn root() -> Self {
        Self::default()
    }

    /// Descend into a child
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Return to the parent
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// A new location one step below this one
    pub fn child(&self, segment: Segment) -> Self {
        let mut location = self.clone();
        location.push(segment);
        location
    }

    /// Number of steps from the root
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Steps from the root
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
