//! Source registry and position resolution.
//!
//! A [`SourceSet`] owns every piece of source text registered with it and
//! assigns each unit a disjoint range of integer positions. A [`Pos`] is
//! opaque and only meaningful to the set that issued it; [`SourceSet::pos_info`]
//! maps it back to a human-oriented (name, line, column) triple.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{Error, Node};

/// Name reported for units registered with an empty name.
const DEFAULT_SOURCE_NAME: &str = "wisp source";

/// An opaque position inside some registered source unit.
///
/// Positions are globally unique and monotonically increasing across all
/// text ever registered in one [`SourceSet`]; they carry no meaning outside
/// the set that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(pub(crate) usize);

impl Pos {
    /// The position `offset` bytes past this one, within the same unit.
    pub(crate) fn advance(self, offset: usize) -> Pos {
        Pos(self.0 + offset)
    }
}

/// Handle to a registered source unit, as returned by [`SourceSet::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceId(usize);

/// Human-oriented details about a [`Pos`]: the registered unit name plus
/// 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PosInfo {
    pub name: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for PosInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            DEFAULT_SOURCE_NAME
        } else {
            &self.name
        };
        write!(f, "{name}:{}:{}:", self.line, self.column)
    }
}

struct SourceFile {
    name: String,
    text: Rc<str>,
    base: usize,
}

/// Registry of parsed source units.
///
/// The set owns all registered records for its lifetime and only ever
/// accumulates them; parsing never removes a record. The handle is cheap to
/// clone and shares one underlying registry, so scopes can keep resolving
/// positions while the host registers further units (the usual pattern for
/// a line-by-line driver). Single-threaded by design.
#[derive(Clone, Default)]
pub struct SourceSet {
    files: Rc<RefCell<Vec<SourceFile>>>,
}

impl SourceSet {
    pub fn new() -> Self {
        SourceSet::default()
    }

    /// Register `text` under `name`, reserving a fresh position range for it.
    ///
    /// The name is used purely for diagnostics; an empty name falls back to
    /// a fixed default when positions are displayed.
    pub fn register(&self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let name = name.into();
        let text: Rc<str> = text.into().into();
        let mut files = self.files.borrow_mut();
        let base = match files.last() {
            Some(last) => last.base + last.text.len() + 1,
            None => 1,
        };
        tracing::trace!(source = %name, bytes = text.len(), base, "registered source unit");
        files.push(SourceFile { name, text, base });
        SourceId(files.len() - 1)
    }

    /// Parse a previously registered unit into a [`Node::Root`].
    pub fn parse(&self, id: SourceId) -> Result<Node, Error> {
        let (text, base) = {
            let files = self.files.borrow();
            let file = &files[id.0];
            (Rc::clone(&file.text), file.base)
        };
        crate::parser::parse_unit(self, &text, Pos(base))
    }

    /// Register `text` under `name` and parse it in one step.
    pub fn parse_str(
        &self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Node, Error> {
        let id = self.register(name, text);
        self.parse(id)
    }

    /// Resolve `pos` to the unit that owns it.
    ///
    /// Later units always have larger bases than any offset inside an
    /// earlier one, so a containment test alone can match several records;
    /// the first (smallest-base) record whose range contains `pos` is the
    /// owner, and the scan stops there. A position outside every record
    /// resolves to an empty, zeroed `PosInfo`.
    pub fn pos_info(&self, pos: Pos) -> PosInfo {
        let files = self.files.borrow();
        for file in files.iter() {
            if pos.0 >= file.base && pos.0 <= file.base + file.text.len() {
                let offset = pos.0 - file.base;
                let before = &file.text[..offset];
                let line = 1 + before.matches('\n').count();
                let column = match before.rfind('\n') {
                    Some(i) => offset - i,
                    None => offset + 1,
                };
                return PosInfo {
                    name: file.name.clone(),
                    line,
                    column,
                };
            }
        }
        PosInfo::default()
    }
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = self.files.borrow();
        f.debug_struct("SourceSet")
            .field("units", &files.len())
            .finish()
    }
}
