use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Next,
    Begin,
    True,
    False,
}

/// Jump target named `L<number>_<KIND>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    number: u32,
    kind: LabelKind,
}

/// Issues labels from a single counter shared by a whole compilation run.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    issued: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self, kind: LabelKind) -> Label {
        self.issued += 1;
        let label = Label {
            number: self.issued,
            kind,
        };
        trace!(%label, "issued label");
        label
    }

    pub fn issued(&self) -> u32 {
        self.issued
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Next => write!(f, "NEXT"),
            Self::Begin => write!(f, "BEGIN"),
            Self::True => write!(f, "TRUE"),
            Self::False => write!(f, "FALSE"),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}_{}", self.number, self.kind)
    }
}
