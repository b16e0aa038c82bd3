//! Append-only edit trace classifying each committed keystroke against the
//! target, plus the run-length serialization used by session records.

/// Kind of a trace entry; this is the alphabet the RLE form preserves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Match,
    Substitute,
    Delete,
}

impl EditKind {
    pub fn code(&self) -> char {
        match self {
            EditKind::Match => 'm',
            EditKind::Substitute => 's',
            EditKind::Delete => 'd',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'm' => Some(EditKind::Match),
            's' => Some(EditKind::Substitute),
            'd' => Some(EditKind::Delete),
            _ => None,
        }
    }
}

/// One classified keystroke. `OverlapSpace` is a space typed over a
/// non-space target byte: rendered differently, scored as a substitution.
/// `Delete` never comes out of [`AlignmentRecorder::classify`]; backspace
/// trims the trace instead. It stays in the alphabet so decoded traces can
/// represent it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOp {
    Match(u8),
    Substitute(u8),
    OverlapSpace(u8),
    Delete(u8),
}

impl EditOp {
    pub fn kind(&self) -> EditKind {
        match self {
            EditOp::Match(_) => EditKind::Match,
            EditOp::Substitute(_) | EditOp::OverlapSpace(_) => EditKind::Substitute,
            EditOp::Delete(_) => EditKind::Delete,
        }
    }

    pub fn byte(&self) -> u8 {
        match self {
            EditOp::Match(b) | EditOp::Substitute(b) | EditOp::OverlapSpace(b) | EditOp::Delete(b) => {
                *b
            }
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, EditOp::Match(_))
    }
}

/// Records the per-keystroke edit trace for one session.
///
/// Invariant: the trace length always equals the committed input length;
/// the session appends exactly one op per accepted byte and trims exactly
/// one per backspace.
#[derive(Clone, Debug, Default)]
pub struct AlignmentRecorder {
    ops: Vec<EditOp>,
}

impl AlignmentRecorder {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Classifies one keystroke against the expected target byte. Any byte
    /// is accepted as a literal; out-of-alphabet input scores as a mismatch
    /// rather than being filtered here.
    pub fn classify(target: u8, input: u8) -> EditOp {
        if target == input {
            EditOp::Match(input)
        } else if input == b' ' {
            EditOp::OverlapSpace(input)
        } else {
            EditOp::Substitute(input)
        }
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    /// Pops the newest op, returning its byte so the caller can restore the
    /// input buffer to the prior state.
    pub fn trim(&mut self) -> Option<u8> {
        self.ops.pop().map(|op| op.byte())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn matches(&self) -> usize {
        self.ops.iter().filter(|op| op.is_match()).count()
    }

    pub fn mismatches(&self) -> usize {
        self.ops.len() - self.matches()
    }

    /// Running accuracy over the trace so far; 1.0 when nothing has been
    /// typed yet.
    pub fn accuracy(&self) -> f64 {
        if self.ops.is_empty() {
            1.0
        } else {
            self.matches() as f64 / self.ops.len() as f64
        }
    }

    /// The committed input bytes, in order.
    pub fn raw_string(&self) -> String {
        self.ops.iter().map(|op| op.byte() as char).collect()
    }

    /// Run-length encodes the kind sequence in one pass. The leading run
    /// omits its count when it is 1; every later run carries an explicit
    /// decimal count. `msmmm` encodes to `m1s3m`, an all-match trace of
    /// length 4 to `4m`.
    pub fn rle(&self) -> String {
        let mut out = String::new();
        let mut iter = self.ops.iter().map(|op| op.kind());

        let Some(first) = iter.next() else {
            return out;
        };

        let mut prev = first;
        let mut count = 1usize;

        for kind in iter {
            if kind == prev {
                count += 1;
                continue;
            }
            push_run(&mut out, prev, count);
            prev = kind;
            count = 1;
        }
        push_run(&mut out, prev, count);

        out
    }
}

fn push_run(out: &mut String, kind: EditKind, count: usize) {
    if count > 1 || !out.is_empty() {
        out.push_str(&count.to_string());
    }
    out.push(kind.code());
}

/// Expands an RLE string back to its kind-per-position sequence. Returns
/// `None` for malformed input (unknown code, dangling count, overflow).
pub fn rle_decode(encoded: &str) -> Option<Vec<EditKind>> {
    let mut kinds = Vec::new();
    let mut count: Option<usize> = None;

    for c in encoded.chars() {
        if let Some(digit) = c.to_digit(10) {
            let next = count
                .unwrap_or(0)
                .checked_mul(10)?
                .checked_add(digit as usize)?;
            count = Some(next);
        } else {
            let kind = EditKind::from_code(c)?;
            let n = count.take().unwrap_or(1);
            if n == 0 {
                return None;
            }
            kinds.extend(std::iter::repeat(kind).take(n));
        }
    }

    // Trailing digits with no kind code are malformed.
    if count.is_some() {
        return None;
    }

    Some(kinds)
}
