//! Characteristic collector.
//!
//! Turns the element stream into typed characteristic records.  Only a
//! `characteristic` directly under the document root starts a record;
//! deeper ones (NAPAUTHINFO, PXPHYSICAL, PORT, APPADDR...) stay attached
//! to their parent as children, so the resolver can walk the same
//! nesting the document had.
//!
//! ```text
//!  wap-provisioningdoc
//!   ├─ characteristic NAPDEF        → records.napdefs[0]
//!   │   ├─ parm NAPID               →   params["NAPID"]
//!   │   └─ characteristic NAPAUTHINFO →   children[0]
//!   └─ characteristic APPLICATION   → records.applications[0]
//! ```

use std::collections::BTreeMap;

use log::{debug, warn};

use super::{Attribute, DecodeError, TagHandler, attribute};

pub const ROOT_ELEMENT: &str = "wap-provisioningdoc";
const CHARACTERISTIC: &str = "characteristic";
const PARM: &str = "parm";

// ───────────────────────────────────────────────────────────────
// Records
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacteristicType {
    Napdef,
    Application,
    PxLogical,
    PxPhysical,
    NapAuthInfo,
    Port,
    AppAddr,
    Other(String),
}

impl CharacteristicType {
    pub fn from_type(value: &str) -> Self {
        match value {
            "NAPDEF" => Self::Napdef,
            "APPLICATION" => Self::Application,
            "PXLOGICAL" => Self::PxLogical,
            "PXPHYSICAL" => Self::PxPhysical,
            "NAPAUTHINFO" => Self::NapAuthInfo,
            "PORT" => Self::Port,
            "APPADDR" => Self::AppAddr,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One `<characteristic>` block: its `parm` table plus nested blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    pub kind: CharacteristicType,
    pub params: BTreeMap<String, String>,
    pub children: Vec<Characteristic>,
}

impl Characteristic {
    pub fn new(kind: CharacteristicType) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder used by tests and the resolver's own unit tests.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.insert_param(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Characteristic) -> Self {
        self.children.push(child);
        self
    }

    /// Insert a parameter; the first occurrence of a name wins.
    pub fn insert_param(&mut self, name: &str, value: &str) {
        self.params
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Direct children of the given type, in document order.
    pub fn children_of<'a>(
        &'a self,
        kind: &CharacteristicType,
    ) -> impl Iterator<Item = &'a Characteristic> {
        self.children.iter().filter(move |c| &c.kind == kind)
    }
}

/// The three top-level record lists the resolver consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicRecords {
    pub napdefs: Vec<Characteristic>,
    pub applications: Vec<Characteristic>,
    pub pxlogicals: Vec<Characteristic>,
}

// ───────────────────────────────────────────────────────────────
// Collector
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    Before,
    Open,
    Closed,
}

/// [`TagHandler`] that accumulates records for one decode call.
#[derive(Debug)]
pub struct Collector {
    root: RootState,
    stack: Vec<Characteristic>,
    records: CharacteristicRecords,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self {
            root: RootState::Before,
            stack: Vec::new(),
            records: CharacteristicRecords::default(),
        }
    }

    /// Hand out the records.  Fails unless a complete root element was seen.
    pub fn finish(self) -> Result<CharacteristicRecords, DecodeError> {
        match self.root {
            RootState::Closed => Ok(self.records),
            RootState::Before => Err(DecodeError::MissingRoot),
            RootState::Open => Err(DecodeError::UnbalancedElement),
        }
    }

    fn close_characteristic(&mut self) -> Result<(), DecodeError> {
        let done = self.stack.pop().ok_or(DecodeError::UnbalancedElement)?;
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(done);
            return Ok(());
        }
        match done.kind {
            CharacteristicType::Napdef => self.records.napdefs.push(done),
            CharacteristicType::Application => self.records.applications.push(done),
            CharacteristicType::PxLogical => self.records.pxlogicals.push(done),
            ref other => debug!("Ignoring top-level characteristic {:?}", other),
        }
        Ok(())
    }
}

impl TagHandler for Collector {
    fn start_tag(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        _empty: bool,
    ) -> Result<(), DecodeError> {
        match self.root {
            RootState::Before if name == ROOT_ELEMENT => {
                self.root = RootState::Open;
                return Ok(());
            }
            RootState::Before | RootState::Closed => {
                warn!("Rejecting document with root <{}>", name);
                return Err(DecodeError::UnexpectedRoot(name.to_string()));
            }
            RootState::Open => {}
        }

        match name {
            CHARACTERISTIC => {
                let kind = CharacteristicType::from_type(attribute(attributes, "type").unwrap_or(""));
                self.stack.push(Characteristic::new(kind));
            }
            PARM => {
                let Some(current) = self.stack.last_mut() else {
                    debug!("Ignoring parm outside any characteristic");
                    return Ok(());
                };
                match attribute(attributes, "name") {
                    Some(parm) if !parm.is_empty() => {
                        current.insert_param(parm, attribute(attributes, "value").unwrap_or(""));
                    }
                    _ => debug!("Ignoring parm without a name"),
                }
            }
            other => debug!("Ignoring element <{}>", other),
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &str, _empty: bool) -> Result<(), DecodeError> {
        match name {
            CHARACTERISTIC => self.close_characteristic(),
            ROOT_ELEMENT if self.root == RootState::Open && self.stack.is_empty() => {
                self.root = RootState::Closed;
                Ok(())
            }
            ROOT_ELEMENT => Err(DecodeError::UnbalancedElement),
            _ => Ok(()),
        }
    }
}
